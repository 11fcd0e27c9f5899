pub mod complaintdb;
pub mod db;
pub mod userdb;
