pub mod models;
pub mod store;

pub use models::{
    ActivityEvent, Challenge, DashboardStats, MealLog, Memory, NewMealLog, ProfileUpdate, User,
    UserChallenge, WorkoutLog,
};
pub use store::WellnessStore;
