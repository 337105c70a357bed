pub mod approval_merge;
pub mod csv_export;
pub mod day_assembly;
pub mod enrich;
pub mod filter;
pub mod geofence;
pub mod kiosk;
pub mod payroll;
pub mod resolution;
pub mod shift;
pub mod status;
