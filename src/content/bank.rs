//! Built-in question bank. Hand-curated defaults so a deployment works
//! before anyone provides a custom bank file.

use crate::content::{LongTurnTopic, PromptedQuestion, QuestionBank, TierPool};

struct QuestionSeed {
    question: &'static str,
    follow_ups: &'static [&'static str],
}

struct TopicSeed {
    topic: &'static str,
    bullet_points: &'static [&'static str],
}

fn questions(seeds: &[QuestionSeed]) -> Vec<PromptedQuestion> {
    seeds
        .iter()
        .map(|seed| PromptedQuestion {
            question: seed.question.to_string(),
            follow_ups: seed.follow_ups.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

fn topics(seeds: &[TopicSeed]) -> Vec<LongTurnTopic> {
    seeds
        .iter()
        .map(|seed| LongTurnTopic {
            topic: seed.topic.to_string(),
            bullet_points: seed.bullet_points.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

const BASIC_INTERVIEW: &[QuestionSeed] = &[
    QuestionSeed {
        question: "Do you live in a house or an apartment?",
        follow_ups: &[
            "What do you like about living there?",
            "How long have you lived there?",
        ],
    },
    QuestionSeed {
        question: "What do you usually do at the weekend?",
        follow_ups: &[
            "Who do you spend your weekends with?",
            "Did you do that last weekend too?",
        ],
    },
    QuestionSeed {
        question: "Do you like cooking?",
        follow_ups: &[
            "What kind of food do you cook most often?",
            "Who taught you to cook?",
        ],
    },
    QuestionSeed {
        question: "How do you usually travel to work or school?",
        follow_ups: &[
            "How long does the journey take?",
            "Would you like to change the way you travel?",
        ],
    },
    QuestionSeed {
        question: "Do you prefer mornings or evenings?",
        follow_ups: &[
            "What do you usually do in the morning?",
            "Has this changed since you were younger?",
        ],
    },
];

const BASIC_LONG_TURN: &[TopicSeed] = &[
    TopicSeed {
        topic: "Describe your favourite room in your home.",
        bullet_points: &[
            "where it is",
            "what it looks like",
            "what you do there",
            "and explain why you like it",
        ],
    },
    TopicSeed {
        topic: "Describe a meal you enjoyed recently.",
        bullet_points: &[
            "what you ate",
            "where you were",
            "who you were with",
            "and explain why you enjoyed it",
        ],
    },
    TopicSeed {
        topic: "Describe a person you see every day.",
        bullet_points: &[
            "who they are",
            "how you know them",
            "what you do together",
            "and explain how you feel about them",
        ],
    },
    TopicSeed {
        topic: "Describe a shop you often go to.",
        bullet_points: &[
            "where it is",
            "what it sells",
            "how often you go there",
            "and explain why you go there",
        ],
    },
];

const BASIC_DISCUSSION: &[QuestionSeed] = &[
    QuestionSeed {
        question: "Do most people in your country live in houses or apartments?",
        follow_ups: &[
            "Is this changing?",
            "Which do you think is better for families?",
        ],
    },
    QuestionSeed {
        question: "Is home cooking still popular where you live?",
        follow_ups: &[
            "Why do some people prefer eating out?",
            "Do young people cook less than older people?",
        ],
    },
    QuestionSeed {
        question: "How do people usually spend their free time in your country?",
        follow_ups: &[
            "Has this changed over the last twenty years?",
            "Do people have enough free time these days?",
        ],
    },
    QuestionSeed {
        question: "Is public transport good in your city?",
        follow_ups: &[
            "Should governments spend more on it?",
            "Why do some people still prefer cars?",
        ],
    },
];

const INTERMEDIATE_INTERVIEW: &[QuestionSeed] = &[
    QuestionSeed {
        question: "What kind of music do you listen to, and has your taste changed over time?",
        follow_ups: &[
            "Do you prefer listening at home or at live events?",
            "Is music important in your culture?",
        ],
    },
    QuestionSeed {
        question: "How do you usually keep in touch with friends who live far away?",
        follow_ups: &[
            "Is that different from how your parents kept in touch?",
            "Do you think online friendships are as strong as face-to-face ones?",
        ],
    },
    QuestionSeed {
        question: "Tell me about a skill you are trying to improve at the moment.",
        follow_ups: &[
            "What is the hardest part of learning it?",
            "How do you stay motivated?",
        ],
    },
    QuestionSeed {
        question: "Do you pay attention to the news? Why or why not?",
        follow_ups: &[
            "Where do you usually get news from?",
            "Do you trust what you read online?",
        ],
    },
    QuestionSeed {
        question: "What role does sport play in your life?",
        follow_ups: &[
            "Did you play more or less sport as a child?",
            "Do you prefer watching or taking part?",
        ],
    },
];

const INTERMEDIATE_LONG_TURN: &[TopicSeed] = &[
    TopicSeed {
        topic: "Describe a journey that did not go as planned.",
        bullet_points: &[
            "where you were going",
            "what went wrong",
            "how you dealt with it",
            "and explain what you learned from the experience",
        ],
    },
    TopicSeed {
        topic: "Describe a teacher who influenced you.",
        bullet_points: &[
            "who they were",
            "what they taught you",
            "how they treated their students",
            "and explain why you still remember them",
        ],
    },
    TopicSeed {
        topic: "Describe a piece of technology you could not live without.",
        bullet_points: &[
            "what it is",
            "how often you use it",
            "what you use it for",
            "and explain what life would be like without it",
        ],
    },
    TopicSeed {
        topic: "Describe an occasion when you helped someone.",
        bullet_points: &[
            "who you helped",
            "what the situation was",
            "what you did",
            "and explain how you felt afterwards",
        ],
    },
    TopicSeed {
        topic: "Describe a tradition that is important in your country.",
        bullet_points: &[
            "what the tradition is",
            "when it takes place",
            "what people do",
            "and explain why it matters to people",
        ],
    },
];

const INTERMEDIATE_DISCUSSION: &[QuestionSeed] = &[
    QuestionSeed {
        question: "Do you think travel genuinely broadens the mind, or is that a cliché?",
        follow_ups: &[
            "Can people learn the same things without leaving home?",
            "How has tourism changed the places people visit?",
        ],
    },
    QuestionSeed {
        question: "What makes a good teacher, in your opinion?",
        follow_ups: &[
            "Should teachers be strict or friendly?",
            "Will technology ever replace teachers?",
        ],
    },
    QuestionSeed {
        question: "Are people too dependent on their phones these days?",
        follow_ups: &[
            "What would happen if phones disappeared for a week?",
            "Should phone use be limited for children?",
        ],
    },
    QuestionSeed {
        question: "Why do some traditions survive while others disappear?",
        follow_ups: &[
            "Is globalisation a threat to local traditions?",
            "Should governments protect traditional customs?",
        ],
    },
    QuestionSeed {
        question: "Is it better to help people directly or to give money to organisations?",
        follow_ups: &[
            "Why do some people avoid helping strangers?",
            "Does social media make people more or less generous?",
        ],
    },
];

const ADVANCED_INTERVIEW: &[QuestionSeed] = &[
    QuestionSeed {
        question: "To what extent does your work or study define who you are?",
        follow_ups: &[
            "Is that a healthy way to think about identity?",
            "How do people in your country typically answer that question?",
        ],
    },
    QuestionSeed {
        question: "How has your relationship with your home town evolved over the years?",
        follow_ups: &[
            "Could you imagine moving back permanently?",
            "What do people misunderstand about the place?",
        ],
    },
    QuestionSeed {
        question: "What assumptions do people tend to make about your generation?",
        follow_ups: &[
            "Which of those assumptions are fair?",
            "How do generational stereotypes arise?",
        ],
    },
    QuestionSeed {
        question: "Describe your approach to making difficult decisions.",
        follow_ups: &[
            "Has a snap decision ever served you better than deliberation?",
            "Do you consult others, or decide alone?",
        ],
    },
    QuestionSeed {
        question: "What does success mean to you, beyond the obvious measures?",
        follow_ups: &[
            "Has your definition shifted over time?",
            "Is your society's definition of success changing?",
        ],
    },
];

const ADVANCED_LONG_TURN: &[TopicSeed] = &[
    TopicSeed {
        topic: "Describe a belief or opinion you held strongly and later changed.",
        bullet_points: &[
            "what you used to believe",
            "what prompted the change",
            "how the shift affected your behaviour",
            "and explain what the experience taught you about changing one's mind",
        ],
    },
    TopicSeed {
        topic: "Describe a time when you had to defend an unpopular position.",
        bullet_points: &[
            "what the position was",
            "who you were arguing with",
            "how you made your case",
            "and explain whether you would argue it the same way today",
        ],
    },
    TopicSeed {
        topic: "Describe a public figure whose influence you consider underrated.",
        bullet_points: &[
            "who they are",
            "what they have done",
            "why their influence goes unnoticed",
            "and explain what wider recognition would change",
        ],
    },
    TopicSeed {
        topic: "Describe a risk you took that others advised against.",
        bullet_points: &[
            "what the risk was",
            "why others objected",
            "how events unfolded",
            "and explain how it shaped your attitude to risk",
        ],
    },
    TopicSeed {
        topic: "Describe a problem in your field that you think will be solved within your lifetime.",
        bullet_points: &[
            "what the problem is",
            "why it has resisted solution so far",
            "what progress is being made",
            "and explain the consequences of solving it",
        ],
    },
];

const ADVANCED_DISCUSSION: &[QuestionSeed] = &[
    QuestionSeed {
        question: "Is intellectual humility compatible with strong leadership?",
        follow_ups: &[
            "Do voters reward leaders who admit mistakes?",
            "How should institutions cultivate it?",
        ],
    },
    QuestionSeed {
        question: "Does the pace of technological change outstrip society's ability to adapt?",
        follow_ups: &[
            "Which institutions are struggling most?",
            "Is deliberate slowing of innovation ever justified?",
        ],
    },
    QuestionSeed {
        question: "To what degree should individuals be held responsible for collective problems like climate change?",
        follow_ups: &[
            "Does focusing on individual behaviour let institutions off the hook?",
            "What actually changes behaviour at scale?",
        ],
    },
    QuestionSeed {
        question: "Is the decline of shared public discourse exaggerated?",
        follow_ups: &[
            "What role do recommendation algorithms play?",
            "Can a society function without common reference points?",
        ],
    },
    QuestionSeed {
        question: "Should expertise carry more weight than public opinion in policy-making?",
        follow_ups: &[
            "How should experts earn public trust?",
            "Where has deference to expertise gone wrong?",
        ],
    },
];

pub fn built_in() -> QuestionBank {
    QuestionBank {
        basic: TierPool {
            interview: questions(BASIC_INTERVIEW),
            long_turn: topics(BASIC_LONG_TURN),
            discussion: questions(BASIC_DISCUSSION),
        },
        intermediate: TierPool {
            interview: questions(INTERMEDIATE_INTERVIEW),
            long_turn: topics(INTERMEDIATE_LONG_TURN),
            discussion: questions(INTERMEDIATE_DISCUSSION),
        },
        advanced: TierPool {
            interview: questions(ADVANCED_INTERVIEW),
            long_turn: topics(ADVANCED_LONG_TURN),
            discussion: questions(ADVANCED_DISCUSSION),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tier_has_multiple_items_per_part() {
        let bank = built_in();
        for pool in [&bank.basic, &bank.intermediate, &bank.advanced] {
            assert!(pool.interview.len() >= 2);
            assert!(pool.long_turn.len() >= 2);
            assert!(pool.discussion.len() >= 2);
        }
    }

    #[test]
    fn test_no_duplicate_prompts_within_a_part() {
        let bank = built_in();
        for pool in [&bank.basic, &bank.intermediate, &bank.advanced] {
            let mut seen = std::collections::HashSet::new();
            for q in &pool.interview {
                assert!(seen.insert(q.question.clone()));
            }
        }
    }
}
