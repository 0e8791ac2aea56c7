use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Actions that feed into a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Like,
    Comment,
    Mention,
}

impl ActionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionType::Like => "like",
            ActionType::Comment => "comment",
            ActionType::Mention => "mention",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "like" => Some(ActionType::Like),
            "comment" => Some(ActionType::Comment),
            "mention" => Some(ActionType::Mention),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of the user who contributed to a notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

/// Ordered by recency of contribution, most recent last.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult,
)]
pub struct ActorList(pub Vec<Actor>);

/// Ordered by recency of contribution, most recent last. Unknown action
/// strings are kept as-is.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult,
)]
pub struct ActionTypeList(pub Vec<String>);

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Recipient.
    pub user_id: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub actors: ActorList,
    #[sea_orm(column_type = "JsonBinary")]
    pub action_types: ActionTypeList,
    pub reference_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub reference_content: String,
    pub is_read: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn last_actor(&self) -> Option<&Actor> {
        self.actors.0.last()
    }

    pub fn last_action(&self) -> Option<&str> {
        self.action_types.0.last().map(String::as_str)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_round_trips_known_tags() {
        for action in [ActionType::Like, ActionType::Comment, ActionType::Mention] {
            assert_eq!(ActionType::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn action_type_rejects_unknown() {
        assert_eq!(ActionType::parse("share"), None);
        assert_eq!(ActionType::parse("Like"), None);
    }

    #[test]
    fn actor_list_serializes_as_plain_array() {
        let list = ActorList(vec![Actor {
            id: "u1".to_string(),
            name: "Ali".to_string(),
            avatar: String::new(),
        }]);
        let json = serde_json::to_value(&list).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["name"], "Ali");
    }
}
