pub mod user;
pub mod product;
pub mod category;
pub mod cart;
pub mod favorite;
pub mod order;
pub mod reset_token;

pub use user::*;
pub use product::*;
pub use category::*;
pub use cart::*;
pub use favorite::*;
pub use order::*;
pub use reset_token::*;
