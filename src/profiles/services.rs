use crate::auth::password::MIN_PASSWORD_LEN;

use super::dto::{ChangePasswordRequest, ProfileUpdate};

/// Trims free-text fields and drops blank or duplicate allergies.
pub fn normalize(update: &mut ProfileUpdate) -> Result<(), String> {
    update.first_name = update.first_name.trim().to_string();
    update.last_name = update.last_name.trim().to_string();
    update.diet_type = update.diet_type.trim().to_string();
    if update.calorie_goal < 0 {
        return Err("Calorie goal must not be negative".into());
    }

    let mut allergies: Vec<String> = Vec::with_capacity(update.allergies.len());
    for a in update.allergies.iter().map(|a| a.trim()) {
        if !a.is_empty() && !allergies.iter().any(|seen| seen.eq_ignore_ascii_case(a)) {
            allergies.push(a.to_string());
        }
    }
    update.allergies = allergies;
    Ok(())
}

/// Shape checks that do not need the stored hash.
pub fn validate_password_change(req: &ChangePasswordRequest) -> Result<(), String> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err("Please fill in all password fields".into());
    }
    if req.new_password != req.confirm_password {
        return Err("New passwords do not match".into());
    }
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}
