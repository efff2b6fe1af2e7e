use std::sync::Arc;

use crate::models::{Booking, BookingStatus, Provider};
use crate::state::AppState;

/// Tell the guest their booking was decided. Fire-and-forget: the spawned
/// send logs transport failures and can never fail the enclosing request
/// or roll back the transition it reports on.
pub fn booking_decision(state: &Arc<AppState>, booking: &Booking, service_name: &str) {
    let verb = match booking.status() {
        BookingStatus::Approved => "approved",
        BookingStatus::Rejected => "rejected",
        BookingStatus::Pending => return,
    };
    let subject = format!("Your booking {} was {verb}", booking.id());
    let body = render_booking_summary(booking, service_name);
    deliver(state, booking.guest_email().to_string(), subject, body);
}

pub fn application_approved(state: &Arc<AppState>, provider: &Provider, credential: &str) {
    let subject = format!("{}: application approved", provider.business_name);
    let body = format!(
        "Hello {},\n\nYour provider application for {} has been approved.\n\
         You can now sign in with your registered email and this password:\n\n    {}\n\n\
         Please change it after your first sign-in.",
        provider.contact_name, provider.business_name, credential,
    );
    deliver(state, provider.email.clone(), subject, body);
}

pub fn application_rejected(state: &Arc<AppState>, provider: &Provider) {
    let subject = format!("{}: application update", provider.business_name);
    let body = format!(
        "Hello {},\n\nWe are sorry to inform you that your provider application for {} \
         was not approved.",
        provider.contact_name, provider.business_name,
    );
    deliver(state, provider.email.clone(), subject, body);
}

pub fn password_change_code(state: &Arc<AppState>, email: &str, code: &str) {
    let subject = "Your password change code".to_string();
    let body = format!(
        "Use this code to confirm your password change:\n\n    {code}\n\n\
         It expires in 10 minutes. If you did not request this, ignore this message.",
    );
    deliver(state, email.to_string(), subject, body);
}

fn render_booking_summary(booking: &Booking, service_name: &str) -> String {
    let verb = match booking.status() {
        BookingStatus::Approved => "approved",
        BookingStatus::Rejected => "rejected",
        BookingStatus::Pending => "pending",
    };

    let details = match booking {
        Booking::Accommodation(b) => format!(
            "Stay at {service_name}\nCheck-in: {}\nCheck-out: {}\nGuests: {}",
            b.check_in, b.check_out, b.total_guests,
        ),
        Booking::Transportation(b) => format!(
            "Trip with {service_name}\nTravel date: {}\nSeats: {}",
            b.travel_date, b.seats,
        ),
        Booking::SportAdventure(b) => format!(
            "{service_name}\nActivity date: {}\nParticipants: {}",
            b.activity_date, b.participants,
        ),
    };

    format!(
        "Hello {},\n\nYour booking has been {verb}.\n\n{details}\nTotal price: {:.2}\n\
         Booking reference: {}",
        booking.guest_name(),
        booking.total_price(),
        booking.id(),
    )
}

fn deliver(state: &Arc<AppState>, to: String, subject: String, body: String) {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        if let Err(e) = state.mailer.send(&to, &subject, &body).await {
            tracing::error!(error = %e, to = %to, subject = %subject, "failed to deliver notification");
        }
    });
}
