pub mod complaintmodel;
pub mod statsmodel;
pub mod usermodel;
