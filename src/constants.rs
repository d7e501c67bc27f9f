pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 1440;
pub const AMOUNT_MIN: i32 = 1;
pub const AMOUNT_MAX: i32 = 32000;
pub const RECIPE_NAME_MAX_LEN: usize = 200;

pub const EMAIL_MAX_LEN: usize = 254;
pub const USERNAME_MAX_LEN: usize = 150;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Usernames that collide with routes under `/users/`.
pub const RESERVED_USERNAMES: &[&str] = &["me"];

pub const SHOPPING_LIST_HEADER: &str = "Shopping list:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const TOKEN_LIFETIME_HOURS: i64 = 24;
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;
