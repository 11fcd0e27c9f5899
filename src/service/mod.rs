pub mod analytics_service;
pub mod assignment_service;
pub mod closure_service;
pub mod complaint_service;
pub mod error;
pub mod notification_service;
pub mod policy;
