use crate::model::{Id, user::UserMarker};

/// Whoever is making the current request.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub enum Viewer {
    #[default]
    Anonymous,
    Authenticated(Id<UserMarker>),
}

impl Viewer {
    #[must_use]
    pub fn user_id(self) -> Option<Id<UserMarker>> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(id) => Some(id),
        }
    }

    #[must_use]
    pub fn is(self, user: Id<UserMarker>) -> bool {
        self.user_id() == Some(user)
    }
}

impl From<Option<Id<UserMarker>>> for Viewer {
    fn from(value: Option<Id<UserMarker>>) -> Self {
        value.map_or(Viewer::Anonymous, Viewer::Authenticated)
    }
}
