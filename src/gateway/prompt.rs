use crate::quiz::ai_helper::RemediationRequest;

pub const SYSTEM_PROMPT: &str = "You are an experienced teacher of algorithms and data structures.
Your job is to help a student understand why their answer is wrong and to explain the right answer in simple words.
Use metaphors and real-life examples. Be friendly and supportive.

After the explanation, come up with a NEW similar question with 4 answer options to reinforce the topic.
The question must test the same understanding but be phrased differently.

Reply with JSON in this format:
{
  \"explanation\": \"your explanation (2-3 sentences)\",
  \"newQuestion\": {
    \"question\": \"the new question\",
    \"options\": [
      {\"id\": \"a\", \"text\": \"option 1\", \"correct\": false},
      {\"id\": \"b\", \"text\": \"option 2\", \"correct\": true},
      {\"id\": \"c\", \"text\": \"option 3\", \"correct\": false},
      {\"id\": \"d\", \"text\": \"option 4\", \"correct\": false}
    ]
  }
}";

pub fn user_prompt(request: &RemediationRequest) -> String {
    format!(
        "Question: {}

Student's answer: {}
Correct answer: {}

Base explanation: {}

Attempt #{}

Please explain the mistake to the student and come up with a new similar question.",
        request.question,
        request.user_answer,
        request.correct_answer,
        request.explanation,
        request.attempt_count.saturating_add(1)
    )
}
