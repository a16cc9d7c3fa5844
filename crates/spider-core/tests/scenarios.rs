use rand::SeedableRng;
use rand::rngs::StdRng;
use spider_core::game::{EngineConfig, LossReason, MemorySink, Outcome, Session, Submission, SubmissionSink};
use spider_core::inference::{NoTieBreak, QuestionScorer, RandomTieBreak, StopReason};
use spider_core::model::answer::{Answer, PlayerAnswer};
use spider_core::model::character::Character;
use spider_core::model::id::QuestionId;
use spider_core::model::knowledge::KnowledgeBase;
use spider_core::model::question::Question;

#[test]
fn single_yes_makes_the_matching_character_confident() {
    let kb = KnowledgeBase::new(
        vec![
            Question::new("q1", "Is your character a knight?"),
            Question::new("q2", "Does your character live in a castle?"),
        ],
        vec![
            Character::new("a", "Lancelot")
                .with_answer("q1", Answer::Yes)
                .with_answer("q2", Answer::Yes),
            Character::new("b", "Merlin")
                .with_answer("q1", Answer::No)
                .with_answer("q2", Answer::No),
        ],
    );
    let config = EngineConfig::default();
    let threshold = config.confidence_threshold;
    let mut session = Session::start(&kb, config, &mut NoTieBreak).unwrap();

    let question = session.current_question().unwrap().id.clone();
    assert_eq!(question.as_str(), "q1");
    session
        .answer(&question, PlayerAnswer::Yes, &mut NoTieBreak)
        .unwrap();

    let a = session.belief().prob(&"a".into()).unwrap();
    assert!((a - 0.78125).abs() < 1e-9, "got {a}");
    assert!(a > threshold);

    let guess = session.current_guess().expect("immediate guess");
    assert_eq!(guess.character_name, "Lancelot");
    assert_eq!(guess.reason, StopReason::Confident);
    assert!(session.current_question().is_none());
}

#[test]
fn sole_character_rejected_exhausts_the_candidates() {
    let kb = KnowledgeBase::new(
        vec![Question::new("q1", "Is your character a ghost?")],
        vec![Character::new("ghost", "The Grey Lady").with_answer("q1", Answer::Yes)],
    );
    let mut session = Session::start(&kb, EngineConfig::default(), &mut NoTieBreak).unwrap();

    assert_eq!(
        session.current_guess().map(|g| g.character_id.as_str()),
        Some("ghost")
    );
    session.resolve_guess(false, &mut NoTieBreak).unwrap();

    assert_eq!(
        session.outcome(),
        Some(&Outcome::Loss {
            reason: LossReason::CandidatesExhausted
        })
    );
    assert_eq!(session.guesses().len(), 1);
    assert!(session.guesses_remaining() > 0);
    assert!(session.belief().is_normalized(1e-9));

    let record = session.record();
    assert!(!record.correct);
    assert!(record.final_guess.is_none());
}

#[test]
fn tie_break_picks_one_of_two_identical_questions() {
    let kb = KnowledgeBase::new(
        vec![
            Question::new("twin_a", "Does your character sail?"),
            Question::new("twin_b", "Does your character swim?"),
        ],
        vec![
            Character::new("x", "X")
                .with_answer("twin_a", Answer::Yes)
                .with_answer("twin_b", Answer::Yes),
            Character::new("y", "Y")
                .with_answer("twin_a", Answer::No)
                .with_answer("twin_b", Answer::No),
        ],
    );

    let mut picked = [0usize; 2];
    for seed in 0..100 {
        let mut tie_break = RandomTieBreak::new(StdRng::seed_from_u64(seed), 0.05);
        let session = Session::start(&kb, EngineConfig::default(), &mut tie_break).unwrap();
        match session.current_question().map(|q| q.id.as_str()) {
            Some("twin_a") => picked[0] += 1,
            Some("twin_b") => picked[1] += 1,
            other => panic!("unexpected selection {other:?}"),
        }
    }
    assert!(picked[0] > 0 && picked[1] > 0, "selection never varied: {picked:?}");

    let belief = spider_core::belief::Belief::uniform(&kb).unwrap();
    let asked = vec![QuestionId::new("twin_a")];
    for seed in 0..20 {
        let mut tie_break = RandomTieBreak::new(StdRng::seed_from_u64(seed), 0.05);
        let pick = QuestionScorer::select(&kb, &belief, &asked, &mut tie_break).unwrap();
        assert_eq!(pick.question.id.as_str(), "twin_b");
    }
}

#[test]
fn finished_session_is_handed_to_a_sink() {
    let kb = KnowledgeBase::new(
        vec![Question::new("q1", "Is your character a cat?")],
        vec![
            Character::new("cat", "Cheshire Cat").with_answer("q1", Answer::Yes),
            Character::new("dog", "Toto").with_answer("q1", Answer::No),
        ],
    );
    let mut session = Session::start(&kb, EngineConfig::default(), &mut NoTieBreak).unwrap();
    session
        .answer(&"q1".into(), PlayerAnswer::Yes, &mut NoTieBreak)
        .unwrap();
    session.resolve_guess(true, &mut NoTieBreak).unwrap();

    let mut sink = MemorySink::new();
    sink.submit(&Submission::new("2026-10-16T00:00:00Z", session.record()))
        .unwrap();

    let stored = &sink.submissions()[0];
    assert_eq!(stored.session.asked.len(), 1);
    assert_eq!(stored.session.asked[0].answer, PlayerAnswer::Yes);
    assert_eq!(stored.session.final_guess.as_deref(), Some("Cheshire Cat"));
    assert!((stored.session.guess_history[0].probability - 0.78125).abs() < 1e-9);
}
