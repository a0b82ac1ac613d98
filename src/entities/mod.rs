pub mod app_update;
pub mod care_event;
pub mod countdown;
pub mod coupon;
pub mod household;
pub mod household_member;
pub mod pet;
pub mod pet_owner;
pub mod post;
pub mod post_like;
pub mod profile;
pub mod reminder;
pub mod weekly_honor;
pub mod wishlist_item;

pub use app_update::Entity as AppUpdate;
pub use care_event::Entity as CareEvent;
pub use countdown::Entity as Countdown;
pub use coupon::Entity as Coupon;
pub use household::Entity as Household;
pub use household_member::Entity as HouseholdMember;
pub use pet::Entity as Pet;
pub use pet_owner::Entity as PetOwner;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use profile::Entity as Profile;
pub use reminder::Entity as Reminder;
pub use weekly_honor::Entity as WeeklyHonor;
pub use wishlist_item::Entity as WishlistItem;

pub mod prelude;
