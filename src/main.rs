use std::io::{self, Stdout, Write};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use tracing::{error, info, warn};
use unicode_width::UnicodeWidthStr;

use mazefill::config::Config;
use mazefill::score::{self, FileHighScore, HighScoreStore, MemoryHighScore};
use mazefill::search::{spawn_search, PendingSearch};
use mazefill::{CellKind, MoveOutcome, Pos, Session};

const CELL_W: usize = 2;
const HELP: &str = "p: path hint  d: dead-end hint  u: undo  r: reverse  n: new  q: quit";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Glyph {
    Agent,
    Wall,
    Empty,
    Filled,
    DeadEnd,
    Start,
    End,
    Hint,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum HintKind {
    Path,
    DeadEnd,
}

/// A search in flight, tagged with the session revision it was asked about.
struct InFlight {
    kind: HintKind,
    revision: u64,
    pending: PendingSearch,
}

struct Renderer {
    last: Vec<Cell>,
    last_hud: String,
    last_status: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Cell {
                    glyph: Glyph::Empty,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            last_status: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    fn resize(&mut self, width: usize, height: usize) {
        *self = Renderer::new(width, height);
    }
}

/// Everything the terminal view shows besides the session itself.
struct Ui {
    hint: Option<Vec<Pos>>,
    in_flight: Vec<InFlight>,
    status: String,
}

fn main() -> io::Result<()> {
    let config = Config::load();
    init_logging(&config.logging.level);
    info!(?config, "starting");

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &config);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    if let Err(e) = &result {
        error!("terminal error: {}", e);
    }
    result
}

/// Log to a file in the data directory; the terminal belongs to the game.
fn init_logging(level: &str) {
    let file = match score::data_dir().and_then(|dir| score::create_log_file(&dir)) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("mazefill: logging disabled: {}", e);
            return;
        }
    };
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn open_store() -> Box<dyn HighScoreStore> {
    match FileHighScore::in_data_dir() {
        Ok(store) => {
            info!("High score file: {:?}", store.path());
            Box::new(store)
        }
        Err(e) => {
            warn!("High score will not persist: {}", e);
            Box::new(MemoryHighScore::default())
        }
    }
}

fn run(stdout: &mut Stdout, config: &Config) -> io::Result<()> {
    let mut rng = rand::thread_rng();
    let mut store = open_store();
    let mut session = Session::new(&mut rng, config.maze.cols, config.maze.rows, config.profile())
        .with_high_score(store.load())
        .with_size_limit(config.maze.max_cols, config.maze.max_rows);
    session.set_reverse_mode(config.game.reverse_mode);

    let mut renderer = Renderer::new(session.grid().cols, session.grid().rows);
    let mut ui = Ui {
        hint: None,
        in_flight: Vec::new(),
        status: String::from(HELP),
    };
    let frame_time = Duration::from_micros(1_000_000 / config.display.fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                let step = match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Up | KeyCode::Char('k') => Some((0, -1)),
                    KeyCode::Down | KeyCode::Char('j') => Some((0, 1)),
                    KeyCode::Left | KeyCode::Char('h') => Some((-1, 0)),
                    KeyCode::Right | KeyCode::Char('l') => Some((1, 0)),
                    KeyCode::Char('u') | KeyCode::Backspace => {
                        if session.undo() {
                            ui.hint = None;
                        }
                        None
                    }
                    KeyCode::Char('r') => {
                        let on = !session.reverse_mode();
                        session.set_reverse_mode(on);
                        ui.status = format!("Reverse mode {}", if on { "on" } else { "off" });
                        None
                    }
                    KeyCode::Char('p') => {
                        request_hint(&session, &mut ui, HintKind::Path);
                        None
                    }
                    KeyCode::Char('d') => {
                        request_hint(&session, &mut ui, HintKind::DeadEnd);
                        None
                    }
                    KeyCode::Char('n') => {
                        session.new_run(&mut rng, config.maze.cols, config.maze.rows);
                        renderer.resize(session.grid().cols, session.grid().rows);
                        ui.hint = None;
                        ui.status = String::from("New run");
                        None
                    }
                    _ => None,
                };

                if let Some((dx, dy)) = step {
                    if let MoveOutcome::Moved { bonus } = session.attempt_move(dx, dy) {
                        ui.hint = None;
                        if bonus > 0 {
                            ui.status = format!("Dead end found! +{}", bonus);
                        }
                    }
                }
            }
        }

        if let Some(done) = session.check_completion(Instant::now()) {
            if let Some(best) = done.new_high_score {
                if let Err(e) = store.save(best) {
                    error!("Failed to save high score: {}", e);
                }
            }
            ui.status = format!(
                "Maze complete! Finish bonus +{}{}",
                done.finish_bonus,
                if done.new_high_score.is_some() { "  NEW HIGH SCORE" } else { "" }
            );
            session.regenerate(&mut rng, done.next_cols, done.next_rows);
            renderer.resize(session.grid().cols, session.grid().rows);
            ui.hint = None;
        }

        collect_hints(&session, &mut ui);
        render(stdout, &session, &ui, &mut renderer)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

/// Start a search unless one of the same kind is still running.
fn request_hint(session: &Session, ui: &mut Ui, kind: HintKind) {
    if ui.in_flight.iter().any(|f| f.kind == kind) {
        return;
    }
    let request = match kind {
        HintKind::Path => Some(session.path_hint_request()),
        HintKind::DeadEnd => session.dead_end_request(),
    };
    match request {
        Some(request) => ui.in_flight.push(InFlight {
            kind,
            revision: session.revision(),
            pending: spawn_search(request),
        }),
        None => ui.status = String::from("No dead ends left"),
    }
}

fn collect_hints(session: &Session, ui: &mut Ui) {
    let mut still_running = Vec::new();
    for flight in ui.in_flight.drain(..) {
        match flight.pending.poll() {
            None => still_running.push(flight),
            // the agent moved or the maze changed since the request
            Some(_) if flight.revision != session.revision() => {}
            Some(response) => {
                // a single cell means the agent is already there
                let path = response.path.filter(|p| p.len() > 1);
                if path.is_none() {
                    ui.status = match flight.kind {
                        HintKind::Path => String::from("No route to the exit"),
                        HintKind::DeadEnd => String::from("No reachable dead end"),
                    };
                }
                ui.hint = path;
            }
        }
    }
    ui.in_flight = still_running;
}

fn render(
    stdout: &mut Stdout,
    session: &Session,
    ui: &Ui,
    renderer: &mut Renderer,
) -> io::Result<()> {
    let grid = session.grid();
    let needed_h = (grid.rows + 2) as u16;
    let needed_w = (grid.cols * CELL_W) as u16;

    stdout.queue(MoveTo(0, 0))?;

    let (term_w, term_h) = terminal::size()?;
    if term_w < needed_w || term_h < needed_h {
        stdout.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            needed_w, needed_h, term_w, term_h
        );
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        renderer.needs_full = true;
        return Ok(());
    }

    let origin_x = (term_w - needed_w) / 2;
    let origin_y = (term_h - needed_h) / 2 + 1;
    if origin_x != renderer.origin_x || origin_y != renderer.origin_y {
        renderer.origin_x = origin_x;
        renderer.origin_y = origin_y;
        renderer.needs_full = true;
    }
    if renderer.needs_full {
        stdout.queue(Clear(ClearType::All))?;
    }

    let (filled, total) = session.progress();
    let hud = format!(
        "Score: {}  Best: {}  Level: {}  Filled: {}/{}  Time: {}s  Mode: {}{}",
        session.score(),
        session.high_score(),
        session.level(),
        filled,
        total,
        session.elapsed_secs(Instant::now()),
        session.profile().name,
        if session.reverse_mode() { "  [reverse]" } else { "" }
    );
    if renderer.needs_full || hud != renderer.last_hud {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y - 1))?;
        stdout.queue(SetForegroundColor(Color::White))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&hud))?;
        stdout.queue(ResetColor)?;
        renderer.last_hud = hud;
    }

    for y in 0..grid.rows {
        for x in 0..grid.cols {
            let pos = Pos { x, y };
            let cell = cell_for(session, ui, pos);
            let idx = y * grid.cols + x;
            if renderer.needs_full || cell != renderer.last[idx] {
                renderer.last[idx] = cell;
                draw_cell(stdout, renderer, x, y, cell)?;
            }
        }
    }

    if renderer.needs_full || ui.status != renderer.last_status {
        stdout.queue(MoveTo(renderer.origin_x, renderer.origin_y + grid.rows as u16))?;
        stdout.queue(Clear(ClearType::CurrentLine))?;
        stdout.queue(Print(&ui.status))?;
        renderer.last_status = ui.status.clone();
    }
    renderer.needs_full = false;

    stdout.flush()?;
    Ok(())
}

fn cell_for(session: &Session, ui: &Ui, pos: Pos) -> Cell {
    let grid = session.grid();
    if pos == session.agent() {
        return Cell {
            glyph: Glyph::Agent,
            color: Color::Yellow,
        };
    }
    if pos == grid.end {
        return Cell {
            glyph: Glyph::End,
            color: Color::Green,
        };
    }
    if ui.hint.as_ref().is_some_and(|h| h.contains(&pos)) {
        return Cell {
            glyph: Glyph::Hint,
            color: Color::Cyan,
        };
    }
    let cell = &grid.cells[pos.y][pos.x];
    match cell.kind {
        CellKind::Wall => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        CellKind::Path if cell.filled => Cell {
            glyph: Glyph::Filled,
            color: Color::DarkGrey,
        },
        CellKind::Path if cell.is_dead_end => Cell {
            glyph: Glyph::DeadEnd,
            color: Color::Magenta,
        },
        CellKind::Path if pos == grid.start => Cell {
            glyph: Glyph::Start,
            color: Color::White,
        },
        CellKind::Path => Cell {
            glyph: Glyph::Empty,
            color: Color::Reset,
        },
    }
}

fn draw_cell(
    stdout: &mut Stdout,
    renderer: &Renderer,
    x: usize,
    y: usize,
    cell: Cell,
) -> io::Result<()> {
    let text = match cell.glyph {
        Glyph::Agent => "@@",
        Glyph::Wall => "██",
        Glyph::Empty => "  ",
        Glyph::Filled => "░░",
        Glyph::DeadEnd => "◆ ",
        Glyph::Start => "S ",
        Glyph::End => "E ",
        Glyph::Hint => "· ",
    };
    let x_pos = renderer.origin_x + (x * CELL_W) as u16;
    let y_pos = renderer.origin_y + y as u16;
    stdout.queue(MoveTo(x_pos, y_pos))?;
    stdout.queue(SetForegroundColor(cell.color))?;
    stdout.queue(Print(text))?;
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        for _ in 0..(CELL_W - w) {
            stdout.queue(Print(' '))?;
        }
    }
    stdout.queue(ResetColor)?;
    Ok(())
}
