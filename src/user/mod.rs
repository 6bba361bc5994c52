//! Users, their credentials and their preferences.

mod core;
mod email;
mod password;
mod profile_endpoint;

pub use core::{
    NewUser, ProfileUpdate, User, UserID, clear_user_data, create_user, create_user_table,
    delete_user, get_user_by_email, get_user_by_id, update_password, update_profile,
};
#[cfg(test)]
pub use core::count_users;
pub use email::Email;
pub use password::{PasswordHash, ValidatedPassword};
pub use profile_endpoint::{
    change_password_endpoint, clear_data_endpoint, delete_profile_endpoint, get_profile_endpoint,
    seed_defaults_endpoint, update_profile_endpoint,
};
