pub mod complaintdtos;
