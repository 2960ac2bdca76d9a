use crate::contact::Contact;
use crate::store::{ActorId, FoodId, Store};
use crate::types::OwnerId;

/// What a drained contact means for the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Kill { victim: ActorId, by: OwnerId },
    Eat { actor: ActorId, food: FoodId },
    Ignore,
}

/// Maps a contact to its outcome against the current store. Anything already
/// destroyed earlier in the pass, and any actor touching its own trail, is
/// ignored.
pub(crate) fn classify(store: &Store, contact: Contact) -> Outcome {
    match contact {
        Contact::ActorSegment { actor, segment } => {
            let (Some(head), Some(body)) = (store.actor(actor), store.segment(segment)) else {
                return Outcome::Ignore;
            };
            if head.owner == body.owner {
                Outcome::Ignore
            } else {
                Outcome::Kill {
                    victim: actor,
                    by: body.owner,
                }
            }
        }
        Contact::ActorFood { actor, food } => {
            if store.actor(actor).is_none() || store.food(food).is_none() {
                return Outcome::Ignore;
            }
            Outcome::Eat { actor, food }
        }
    }
}
