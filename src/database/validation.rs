//! Input checks that run before any statement touches storage.
//!
//! Every check appends to a [`FieldErrors`] map so a single response reports
//! all offending fields at once. Checks that need storage (tag and ingredient
//! existence) live next to the queries in `actions::recipes`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::RecipeLimits,
    constants::{
        EMAIL_MAX_LEN, PASSWORD_MIN_LEN, PERSON_NAME_MAX_LEN, RESERVED_USERNAMES, USERNAME_MAX_LEN,
    },
    error::{FieldErrors, Result},
    schema::{NewUser, RecipePayload},
};

static USERNAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

const REQUIRED: &str = "This field is required.";

/// Checks a recipe payload against `limits`.
///
/// `require_image` is set on create; an update without an image keeps the
/// stored reference.
pub fn validate_recipe(
    payload: &RecipePayload,
    limits: &RecipeLimits,
    require_image: bool,
) -> Result<()> {
    let mut errors = FieldErrors::new();

    if payload.name.trim().is_empty() {
        errors.add("name", REQUIRED);
    } else if payload.name.chars().count() > limits.name_max_len {
        errors.add(
            "name",
            format!("Ensure this field has no more than {} characters.", limits.name_max_len),
        );
    }

    if payload.text.trim().is_empty() {
        errors.add("text", REQUIRED);
    }

    match &payload.image {
        Some(image) if image.trim().is_empty() => errors.add("image", REQUIRED),
        None if require_image => errors.add("image", REQUIRED),
        _ => {}
    }

    if !limits.cooking_time.contains(&payload.cooking_time) {
        errors.add(
            "cooking_time",
            format!(
                "Cooking time must be between {} and {} minutes.",
                limits.cooking_time.start(),
                limits.cooking_time.end()
            ),
        );
    }

    if payload.tags.is_empty() {
        errors.add("tags", "At least one tag is required.");
    } else if has_duplicates(payload.tags.iter().copied()) {
        errors.add("tags", "Tags must be unique.");
    }

    if payload.ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
    } else {
        if has_duplicates(payload.ingredients.iter().map(|line| line.id)) {
            errors.add("ingredients", "Ingredients must be unique.");
        }
        if payload
            .ingredients
            .iter()
            .any(|line| !limits.amount.contains(&line.amount))
        {
            errors.add(
                "ingredients",
                format!(
                    "Amount must be between {} and {}.",
                    limits.amount.start(),
                    limits.amount.end()
                ),
            );
        }
    }

    errors.into_result()
}

pub fn validate_new_user(user: &NewUser) -> Result<()> {
    let mut errors = FieldErrors::new();

    if user.email.trim().is_empty() {
        errors.add("email", REQUIRED);
    } else if user.email.chars().count() > EMAIL_MAX_LEN || !EMAIL_PATTERN.is_match(&user.email) {
        errors.add("email", "Enter a valid email address.");
    }

    validate_username(&user.username, &mut errors);

    for (field, value) in [("first_name", &user.first_name), ("last_name", &user.last_name)] {
        if value.trim().is_empty() {
            errors.add(field, REQUIRED);
        } else if value.chars().count() > PERSON_NAME_MAX_LEN {
            errors.add(
                field,
                format!("Ensure this field has no more than {PERSON_NAME_MAX_LEN} characters."),
            );
        }
    }

    validate_password("password", &user.password, &mut errors);

    errors.into_result()
}

pub fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
        return;
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        errors.add(
            "username",
            format!("Ensure this field has no more than {USERNAME_MAX_LEN} characters."),
        );
    }
    if !USERNAME_PATTERN.is_match(username) {
        errors.add(
            "username",
            "Username may contain only letters, digits and @/./+/-/_ characters.",
        );
    }
    if RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
    {
        errors.add("username", format!("Username \"{username}\" is not allowed."));
    }
}

pub fn validate_password(field: &str, password: &str, errors: &mut FieldErrors) {
    if password.is_empty() {
        errors.add(field, REQUIRED);
    } else if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            field,
            format!("Password must contain at least {PASSWORD_MIN_LEN} characters."),
        );
    }
}

fn has_duplicates<I: IntoIterator<Item = i32>>(ids: I) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().any(|id| !seen.insert(id))
}
