//! Router facades.
//!
//! A facade owns an underlying [`Router`](crate::Router) and exposes the same
//! registration surface, except every handler goes through the
//! [`Decorators`](crate::middleware::Decorators) chain first.
//!
//! | Facade | Registered path |
//! |---|---|
//! | [`PublicRouter`] | the path as given |
//! | [`AdminRouter`] | the path joined under the admin prefix |

/// Generates the per-method shortcuts. Each forwards to `self.handle`.
macro_rules! method_shortcuts {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Registers a router-native handler for `", stringify!($method), "`.")]
            pub fn $name(self, path: &str, handle: impl crate::handler::Handle) -> Self {
                self.handle(http::Method::$method, path, handle)
            }
        )*
    };
}

mod admin;
mod public;

pub use admin::{ADMIN_PREFIX, AdminRouter};
pub use public::PublicRouter;
