mod user_activity;

pub use user_activity::UserActivity;
