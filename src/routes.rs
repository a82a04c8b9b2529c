//! Navigation targets the flows steer toward.

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const ADMIN_LOGIN: &str = "/admin/login";
pub const SIGNUP: &str = "/signup";
pub const PROVIDER_DASHBOARD: &str = "/provider/dashboard";
pub const PROVIDER_REGISTER: &str = "/provider/register";

/// Receipt view for one payment, id percent-encoded into the path.
pub fn receipt(payment_id: &str) -> String {
    format!("/receipt/{}", urlencoding::encode(payment_id))
}
