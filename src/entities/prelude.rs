pub use super::app_update::Entity as AppUpdate;
pub use super::care_event::Entity as CareEvent;
pub use super::countdown::Entity as Countdown;
pub use super::coupon::Entity as Coupon;
pub use super::household::Entity as Household;
pub use super::household_member::Entity as HouseholdMember;
pub use super::pet::Entity as Pet;
pub use super::pet_owner::Entity as PetOwner;
pub use super::post::Entity as Post;
pub use super::post_like::Entity as PostLike;
pub use super::profile::Entity as Profile;
pub use super::reminder::Entity as Reminder;
pub use super::weekly_honor::Entity as WeeklyHonor;
pub use super::wishlist_item::Entity as WishlistItem;
