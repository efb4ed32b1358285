pub mod booking;
pub mod enums;
pub mod facility;
pub mod homestay;
pub mod homestay_facility;
pub mod password_reset_token;
pub mod room;
pub mod user;

pub use booking::{Entity as Booking, Model as BookingModel};
pub use enums::{Role, RoomStatus, VerificationStatus};
pub use facility::{Entity as Facility, Model as FacilityModel};
pub use homestay::{Entity as Homestay, Model as HomestayModel};
pub use homestay_facility::Entity as HomestayFacility;
pub use password_reset_token::Entity as PasswordResetToken;
pub use room::{Entity as Room, Model as RoomModel};
pub use user::{Entity as User, Model as UserModel};
