pub mod category;
pub mod comment;
pub mod post;
pub mod user;

pub use category::{Category, CategoryChanges, NewCategory};
pub use comment::{Comment, CommentChanges, NewComment};
pub use post::{NewPost, Post, PostChanges};
pub use user::{NewUser, User};
