use std::time::Instant;

use mazefill::difficulty::{DifficultyProfile, CRUEL};
use mazefill::score::{HighScoreStore, MemoryHighScore};
use mazefill::search::{handle_request, spawn_search};
use mazefill::{MoveOutcome, Pos, Session, SessionState};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn follow(session: &mut Session, path: &[Pos]) {
    for pair in path.windows(2) {
        let dx = pair[1].x as isize - pair[0].x as isize;
        let dy = pair[1].y as isize - pair[0].y as isize;
        assert!(matches!(session.attempt_move(dx, dy), MoveOutcome::Moved { .. }));
    }
}

#[test]
fn solve_with_path_hint_and_record_high_score() {
    let mut rng = StdRng::seed_from_u64(77);
    let mut store = MemoryHighScore::default();
    let mut session = Session::new(&mut rng, 20, 14, DifficultyProfile::from_name("hard"))
        .with_high_score(store.load())
        .with_size_limit(23, 99);
    assert_eq!((session.grid().cols, session.grid().rows), (21, 15));

    let hint = spawn_search(session.path_hint_request()).wait();
    let path = hint.path.expect("maze is solvable");
    assert_eq!(path[0], session.agent());
    follow(&mut session, &path);

    assert_eq!(session.agent(), session.grid().end);
    let done = session.check_completion(Instant::now()).expect("at the exit");
    assert_eq!(session.state(), SessionState::Complete);
    assert!(done.score >= (path.len() - 1) as u64);
    assert_eq!(done.new_high_score, Some(done.score));
    store.save(done.score).unwrap();
    assert_eq!(store.load(), done.score);
    assert_eq!((done.next_cols, done.next_rows), (23, 17));

    let generation = session.generation();
    session.regenerate(&mut rng, done.next_cols, done.next_rows);
    assert!(session.generation() > generation);
    assert_eq!((session.grid().cols, session.grid().rows), (23, 17));
    assert_eq!(session.score(), done.score);
    assert_eq!(session.level(), 2);
}

#[test]
fn dead_end_hint_leads_to_a_bonus() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut session = Session::new(&mut rng, 15, 15, CRUEL);
    let request = session.dead_end_request().expect("a perfect maze has dead ends");
    let path = handle_request(&request).path.expect("dead ends are reachable");
    assert!(path.len() > 1);

    let target = *path.last().unwrap();
    assert!(session.grid().cells[target.y][target.x].is_dead_end);
    let before = session.score();
    follow(&mut session, &path);
    assert!(session.grid().cells[target.y][target.x].bonus_claimed);
    assert_eq!(session.score(), before + (path.len() - 1) as u64 + 30);
}

#[test]
fn undo_everything_returns_to_start() {
    let mut rng = StdRng::seed_from_u64(19);
    let mut session = Session::new(&mut rng, 11, 11, CRUEL);
    let path = handle_request(&session.path_hint_request()).path.unwrap();
    follow(&mut session, &path[..path.len() - 1]);
    let score = session.score();

    while session.undo() {}
    assert_eq!(session.agent(), session.grid().start);
    assert_eq!(session.progress().0, 0);
    assert_eq!(session.score(), score);
}
