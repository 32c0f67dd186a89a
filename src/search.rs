//! Search services over an owned walkability [`Snapshot`].
//!
//! Both searches are plain functions: a snapshot goes in, at most one path
//! comes out. [`handle_request`] is the message boundary used by the worker
//! thread, and [`spawn_search`] runs one request off the calling thread.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Pos, Snapshot};

/// Node pops allowed per grid cell before A* gives up.
pub const EXPANSION_FACTOR: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrontierEntry {
    f: usize,
    g: usize,
    pos: Pos,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .f
            .cmp(&self.f)
            .then_with(|| self.g.cmp(&other.g))
            .then_with(|| self.pos.cmp(&other.pos))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of an A* run together with the number of frontier pops it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstarOutcome {
    pub path: Option<Vec<Pos>>,
    pub expansions: usize,
}

pub fn expansion_budget(snapshot: &Snapshot) -> usize {
    EXPANSION_FACTOR * snapshot.cols * snapshot.rows
}

/// Shortest path from `start` to `goal`, both ends inclusive.
pub fn find_path(snapshot: &Snapshot, start: Pos, goal: Pos) -> Option<Vec<Pos>> {
    astar(snapshot, start, goal).path
}

/// A* with a Manhattan heuristic. Superseded frontier entries are left in the
/// heap and skipped when popped.
pub fn astar(snapshot: &Snapshot, start: Pos, goal: Pos) -> AstarOutcome {
    if !snapshot.is_walkable(start) || !snapshot.is_walkable(goal) {
        return AstarOutcome {
            path: None,
            expansions: 0,
        };
    }

    let budget = expansion_budget(snapshot);
    let mut best_g = vec![usize::MAX; snapshot.cols * snapshot.rows];
    let mut came_from: Vec<Option<Pos>> = vec![None; snapshot.cols * snapshot.rows];
    let mut frontier = BinaryHeap::new();
    let mut expansions = 0;

    best_g[snapshot.index(start)] = 0;
    frontier.push(FrontierEntry {
        f: start.manhattan(goal),
        g: 0,
        pos: start,
    });

    while let Some(FrontierEntry { g, pos, .. }) = frontier.pop() {
        if expansions >= budget {
            debug!(expansions, "a* expansion budget exhausted");
            return AstarOutcome {
                path: None,
                expansions,
            };
        }
        expansions += 1;

        if g > best_g[snapshot.index(pos)] {
            continue;
        }
        if pos == goal {
            return AstarOutcome {
                path: Some(reconstruct(snapshot, &came_from, start, goal)),
                expansions,
            };
        }

        let tentative = g + 1;
        for next in snapshot.open_neighbors(pos) {
            let idx = snapshot.index(next);
            if tentative < best_g[idx] {
                best_g[idx] = tentative;
                came_from[idx] = Some(pos);
                frontier.push(FrontierEntry {
                    f: tentative + next.manhattan(goal),
                    g: tentative,
                    pos: next,
                });
            }
        }
    }

    AstarOutcome {
        path: None,
        expansions,
    }
}

/// Breadth-first search from `start` that stops at the first target dequeued,
/// which is a nearest one by hop count.
pub fn find_nearest(snapshot: &Snapshot, start: Pos, targets: &[Pos]) -> Option<Vec<Pos>> {
    if targets.is_empty() || !snapshot.is_walkable(start) {
        return None;
    }
    let targets: HashSet<Pos> = targets.iter().copied().collect();
    let mut visited = vec![false; snapshot.cols * snapshot.rows];
    let mut came_from: Vec<Option<Pos>> = vec![None; snapshot.cols * snapshot.rows];
    let mut queue = VecDeque::new();

    visited[snapshot.index(start)] = true;
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        if targets.contains(&pos) {
            return Some(reconstruct(snapshot, &came_from, start, pos));
        }
        for next in snapshot.open_neighbors(pos) {
            let idx = snapshot.index(next);
            if !visited[idx] {
                visited[idx] = true;
                came_from[idx] = Some(pos);
                queue.push_back(next);
            }
        }
    }
    None
}

fn reconstruct(snapshot: &Snapshot, came_from: &[Option<Pos>], start: Pos, end: Pos) -> Vec<Pos> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match came_from[snapshot.index(current)] {
            Some(prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Wire form of a search request. `grid` holds 1 for walkable cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub grid: Vec<Vec<u8>>,
    #[serde(default)]
    pub cols: usize,
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub start: Option<Pos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Pos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<Pos>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub path: Option<Vec<Pos>>,
}

impl SearchResponse {
    pub fn none() -> Self {
        SearchResponse { path: None }
    }
}

impl SearchRequest {
    pub fn path(snapshot: &Snapshot, start: Pos, goal: Pos) -> Self {
        SearchRequest {
            grid: snapshot.to_matrix(),
            cols: snapshot.cols,
            rows: snapshot.rows,
            start: Some(start),
            goal: Some(goal),
            targets: None,
        }
    }

    pub fn nearest(snapshot: &Snapshot, start: Pos, targets: Vec<Pos>) -> Self {
        SearchRequest {
            grid: snapshot.to_matrix(),
            cols: snapshot.cols,
            rows: snapshot.rows,
            start: Some(start),
            goal: None,
            targets: Some(targets),
        }
    }
}

/// Answer one request. Malformed requests answer with no path.
pub fn handle_request(request: &SearchRequest) -> SearchResponse {
    let Some(start) = request.start else {
        return SearchResponse::none();
    };
    let Some(snapshot) = Snapshot::from_matrix(&request.grid, request.cols, request.rows) else {
        return SearchResponse::none();
    };
    let path = match (&request.goal, &request.targets) {
        (Some(goal), _) => find_path(&snapshot, start, *goal),
        (None, Some(targets)) => find_nearest(&snapshot, start, targets),
        (None, None) => None,
    };
    SearchResponse { path }
}

/// Answer a JSON-encoded request with a JSON-encoded response.
pub fn handle_json(request: &str) -> String {
    let response = match serde_json::from_str::<SearchRequest>(request) {
        Ok(request) => handle_request(&request),
        Err(e) => {
            debug!("rejecting malformed search request: {}", e);
            SearchResponse::none()
        }
    };
    serde_json::to_string(&response).unwrap_or_else(|_| String::from("{\"path\":null}"))
}

/// Receiving end of a search running on its own thread.
#[derive(Debug)]
pub struct PendingSearch {
    rx: Receiver<SearchResponse>,
}

impl PendingSearch {
    /// Non-blocking check for the response. A worker that died without
    /// answering reads as "no path".
    pub fn poll(&self) -> Option<SearchResponse> {
        match self.rx.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(SearchResponse::none()),
        }
    }

    pub fn wait(self) -> SearchResponse {
        self.rx.recv().unwrap_or_else(|_| SearchResponse::none())
    }
}

/// Run `request` on a fresh worker thread.
pub fn spawn_search(request: SearchRequest) -> PendingSearch {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let response = handle_request(&request);
        // The caller may have stopped listening; a late answer is just dropped.
        let _ = tx.send(response);
    });
    PendingSearch { rx }
}
