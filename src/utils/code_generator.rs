// utils/code_generator.rs
use rand::Rng;

use crate::models::complaintmodel::ComplaintType;

/// Fixed-width numeric confirmation code handed to the customer at closure.
/// Small code space and no verification throttling, kept as-is from the
/// original protocol (see DESIGN.md open questions).
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    format!("{:04}", rng.random_range(0..10000))
}

/// Human-facing ticket code, e.g. `WIFI-48213`. Uniqueness is enforced by the
/// database; callers retry on collision.
pub fn generate_ticket_code(complaint_type: ComplaintType) -> String {
    let mut rng = rand::rng();
    format!(
        "{}-{:05}",
        complaint_type.ticket_prefix(),
        rng.random_range(0..100000)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_four_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 4);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn ticket_code_matches_expected_shape() {
        let re = regex::Regex::new(r"^WIFI-\d{5}$").unwrap();
        for _ in 0..50 {
            assert!(re.is_match(&generate_ticket_code(ComplaintType::Wifi)));
        }
        let re = regex::Regex::new(r"^CCTV-\d{5}$").unwrap();
        assert!(re.is_match(&generate_ticket_code(ComplaintType::Cctv)));
    }
}
