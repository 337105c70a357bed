pub mod approval;
pub mod attendance;
pub mod branch;
pub mod employee;
pub mod kiosk_session;
pub mod payroll;
pub mod role;
pub mod shift_rule;
