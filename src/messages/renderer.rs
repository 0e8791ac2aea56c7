use super::catalog::{self, Language};
use crate::models::{notification::ActionType, NotificationModel};

/// Render the display message for a notification.
///
/// Uses the most recent action and the most recent actor. Unknown actions
/// and notifications without actors render as an empty string.
pub fn render(notification: &NotificationModel, language: Language) -> String {
    let Some(action) = notification.last_action().and_then(ActionType::parse) else {
        return String::new();
    };
    let Some(actor) = notification.last_actor() else {
        return String::new();
    };

    let clause = actor_clause(&actor.name, notification.actor_count(), language);
    fill(
        catalog::template(action, language),
        &clause,
        &notification.reference_content,
    )
}

fn actor_clause(name: &str, actor_count: usize, language: Language) -> String {
    if actor_count > 1 {
        let others = actor_count - 1;
        fill(
            catalog::others_clause(language, others),
            name,
            &others.to_string(),
        )
    } else {
        format!("{}{}", catalog::single_actor_prefix(language), name)
    }
}

/// Replace `%1` and `%2` in one left-to-right pass. Substituted text is
/// copied verbatim, so a `%2` inside `first` stays literal.
fn fill(template: &str, first: &str, second: &str) -> String {
    let mut out = String::with_capacity(template.len() + first.len() + second.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('1') => {
                    chars.next();
                    out.push_str(first);
                    continue;
                }
                Some('2') => {
                    chars.next();
                    out.push_str(second);
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::{ActionTypeList, Actor, ActorList};
    use uuid::Uuid;

    fn actor(id: &str, name: &str) -> Actor {
        Actor {
            id: id.to_string(),
            name: name.to_string(),
            avatar: String::new(),
        }
    }

    fn notification(actors: Vec<Actor>, actions: &[&str], content: &str) -> NotificationModel {
        let now = chrono::Utc::now().naive_utc();
        NotificationModel {
            id: Uuid::new_v4(),
            user_id: "recipient".to_string(),
            actors: ActorList(actors),
            action_types: ActionTypeList(actions.iter().map(|a| a.to_string()).collect()),
            reference_id: Uuid::new_v4(),
            reference_content: content.to_string(),
            is_read: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn single_actor_english() {
        let n = notification(vec![actor("a", "Ali")], &["like"], "Hello");
        assert_eq!(render(&n, Language::En), "Ali liked your post: Hello");
    }

    #[test]
    fn single_actor_arabic_has_rtl_mark() {
        let n = notification(vec![actor("a", "Ali")], &["comment"], "مرحبا");
        assert_eq!(
            render(&n, Language::Ar),
            "علق \u{200F}Ali على مشاركتك: مرحبا"
        );
    }

    #[test]
    fn uses_last_actor_and_last_action() {
        let n = notification(
            vec![actor("b", "Bea"), actor("a", "Ali")],
            &["like", "comment"],
            "nice",
        );
        assert_eq!(
            render(&n, Language::En),
            "Ali and 1 other commented on your post: nice"
        );
    }

    #[test]
    fn english_plural_others() {
        let n = notification(
            vec![actor("a", "A"), actor("b", "B"), actor("c", "C")],
            &["mention"],
            "hey",
        );
        assert_eq!(
            render(&n, Language::En),
            "C and 2 others mentioned you in a comment: hey"
        );
    }

    #[test]
    fn arabic_dual_others() {
        let n = notification(
            vec![actor("a", "A"), actor("b", "B"), actor("c", "C")],
            &["like"],
            "x",
        );
        assert_eq!(
            render(&n, Language::Ar),
            "أبدى C وشخصان آخران إعجاباً بمشاركتك: x"
        );
    }

    #[test]
    fn unknown_action_is_empty() {
        let n = notification(vec![actor("a", "Ali")], &["share"], "Hello");
        assert_eq!(render(&n, Language::En), "");
    }

    #[test]
    fn no_actors_or_actions_is_empty() {
        assert_eq!(render(&notification(vec![], &["like"], "x"), Language::En), "");
        assert_eq!(
            render(&notification(vec![actor("a", "A")], &[], "x"), Language::En),
            ""
        );
    }

    #[test]
    fn placeholders_in_values_stay_literal() {
        let n = notification(vec![actor("a", "%2")], &["like"], "100%1 real");
        assert_eq!(render(&n, Language::En), "%2 liked your post: 100%1 real");
    }

    #[test]
    fn render_is_deterministic() {
        let n = notification(vec![actor("a", "A"), actor("b", "B")], &["like"], "p");
        assert_eq!(render(&n, Language::Ar), render(&n, Language::Ar));
    }
}
