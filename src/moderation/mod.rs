//! Moderator tools beyond post and comment handling.
//!
//! - Emoticon registration
//! - The board announcement

mod announcement;
mod emoticon;

pub use announcement::{
    Announcement, AnnouncementRepository, AnnouncementService, MAX_ANNOUNCEMENT_LENGTH,
};
pub use emoticon::EmoticonAdminService;
