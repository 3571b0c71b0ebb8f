use super::{simple_context, ChatContext, Context, UserContext};
use crate::client::Evogram;
use crate::types::{MessageEntity, Poll, PollAnswer, PollOption, PollType};

pub struct PollContext {
    client: Evogram,
    source: Poll,
}

simple_context!(PollContext, Poll);

impl PollContext {
    pub fn id(&self) -> &str {
        &self.source.id
    }

    pub fn question(&self) -> &str {
        &self.source.question
    }

    pub fn options(&self) -> &[PollOption] {
        &self.source.options
    }

    pub fn total_voter_count(&self) -> u32 {
        self.source.total_voter_count
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_closed
    }

    pub fn is_anonymous(&self) -> bool {
        self.source.is_anonymous
    }

    pub fn poll_type(&self) -> PollType {
        self.source.poll_type
    }

    pub fn allows_multiple_answers(&self) -> bool {
        self.source.allows_multiple_answers
    }

    pub fn correct_option_id(&self) -> Option<u32> {
        self.source.correct_option_id
    }

    pub fn explanation(&self) -> Option<&str> {
        self.source.explanation.as_deref()
    }

    pub fn explanation_entities(&self) -> &[MessageEntity] {
        self.source.explanation_entities.as_deref().unwrap_or_default()
    }

    pub fn open_period(&self) -> Option<u32> {
        self.source.open_period
    }

    /// First option whose text matches exactly.
    pub fn option_by_text(&self, text: &str) -> Option<&PollOption> {
        self.source.options.iter().find(|option| option.text == text)
    }

    /// Share of all voters that picked `option`, in percent. A poll nobody
    /// voted in yields 0.
    pub fn option_percentage(&self, option: &PollOption) -> f64 {
        if self.source.total_voter_count == 0 {
            return 0.0;
        }
        f64::from(option.voter_count) / f64::from(self.source.total_voter_count) * 100.0
    }
}

/// A user changing their vote in a non-anonymous poll.
pub struct PollAnswerContext {
    client: Evogram,
    source: PollAnswer,
}

simple_context!(PollAnswerContext, PollAnswer);

impl PollAnswerContext {
    pub fn poll_id(&self) -> &str {
        &self.source.poll_id
    }

    /// Chosen option indexes; empty when the vote was retracted.
    pub fn option_ids(&self) -> &[u32] {
        &self.source.option_ids
    }

    pub fn user(&self) -> Option<UserContext> {
        self.source
            .user
            .clone()
            .map(|user| UserContext::new(self.client.clone(), user))
    }

    /// Set when an anonymous chat admin voted.
    pub fn voter_chat(&self) -> Option<ChatContext> {
        self.source
            .voter_chat
            .clone()
            .map(|chat| ChatContext::new(self.client.clone(), chat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> Evogram {
        Evogram::builder("TEST_TOKEN")
            .api_url("http://127.0.0.1:9")
            .build()
    }

    fn poll(total: u32, votes: [u32; 2]) -> PollContext {
        PollContext::from_value(
            client(),
            json!({
                "id": "p1",
                "question": "Tea or coffee?",
                "options": [
                    { "text": "Tea", "voter_count": votes[0] },
                    { "text": "Coffee", "voter_count": votes[1] }
                ],
                "total_voter_count": total,
                "is_closed": false,
                "is_anonymous": true,
                "type": "regular",
                "allows_multiple_answers": false
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_option_percentage() {
        let poll = poll(4, [1, 3]);
        let coffee = poll.option_by_text("Coffee").unwrap();
        assert_eq!(poll.option_percentage(coffee), 75.0);
        assert!(poll.option_by_text("Water").is_none());
    }

    #[test]
    fn test_option_percentage_without_votes() {
        let poll = poll(0, [0, 0]);
        let tea = poll.option_by_text("Tea").unwrap();
        assert_eq!(poll.option_percentage(tea), 0.0);
    }

    #[test]
    fn test_retracted_answer_has_no_options() {
        let answer = PollAnswerContext::from_value(
            client(),
            json!({
                "poll_id": "p1",
                "user": { "id": 7, "is_bot": false, "first_name": "Ada" },
                "option_ids": []
            }),
        )
        .unwrap();
        assert!(answer.option_ids().is_empty());
        assert_eq!(answer.user().unwrap().id(), 7);
        assert!(answer.voter_chat().is_none());
    }
}
