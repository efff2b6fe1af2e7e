pub mod approval;
pub mod booking_status;
pub mod catalog;
pub mod credentials;
pub mod ids;
pub mod mailer;
pub mod notify;
pub mod otp;
pub mod uploads;
