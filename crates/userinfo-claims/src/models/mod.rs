//! Data model: attribute values, rich users and UserInfo records

mod attribute;
mod userinfo;
mod value;

pub use attribute::{Attribute, NULL_ATTRIBUTE, RichUser, UserId};
pub use userinfo::{Address, UserInfo, UserInfoBuilder};
pub use value::{AttributeKind, AttributeValue, UnsupportedValue};
