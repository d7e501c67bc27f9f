use crate::{
    error::{Error, Result},
    jwt::SessionData,
    schema::{Recipe, Uuid},
};

/// The identity a response is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }
}

impl From<&SessionData> for Viewer {
    fn from(value: &SessionData) -> Self {
        Viewer::User(value.user_id)
    }
}

impl From<Option<&SessionData>> for Viewer {
    fn from(value: Option<&SessionData>) -> Self {
        value.map(Viewer::from).unwrap_or(Viewer::Anonymous)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ActionType {
    UpdateRecipe,
    DeleteRecipe,
}

impl ActionType {
    /// Recipes are only ever modified by their author.
    pub fn authenticate(self, session: &SessionData, recipe: &Recipe) -> bool {
        match self {
            ActionType::UpdateRecipe | ActionType::DeleteRecipe => {
                recipe.author_id == session.user_id
            }
        }
    }
}

impl SessionData {
    pub fn authorize(&self, action: ActionType, recipe: &Recipe) -> Result<()> {
        if !action.authenticate(self, recipe) {
            return Err(Error::PermissionDenied(String::from(
                "You don't have permission to perform this action",
            )));
        }
        Ok(())
    }
}
