pub mod account;
pub mod chat;
pub mod eco;
pub mod mood;
pub mod planner;
pub mod shared;
pub mod social;

pub use account::AccountView;
pub use chat::ChatView;
pub use eco::EcoView;
pub use mood::MoodView;
pub use planner::PlannerView;
pub use social::SocialView;
