//! Wire types: commands, events, and the per-family state views.
//!
//! Every type here travels as JSON text with an internal `"type"` tag and
//! camelCase payload fields, e.g.
//! `{"type":"join_game","playerName":"ada","gameType":"chess"}`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Game family
// ---------------------------------------------------------------------------

/// The five hosted game families. Fixed per room at creation time.
///
/// The wire names are historical client identifiers; in particular big two
/// travels as `chordaidi` (Cantonese "chor dai di").
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GameFamily {
    Chess,
    Xiangqi,
    #[serde(rename = "chordaidi")]
    ChorDaiDi,
    Boggle,
    Bingo,
}

impl GameFamily {
    /// The wire identifier, also used as the leaderboard key.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Chess => "chess",
            Self::Xiangqi => "xiangqi",
            Self::ChorDaiDi => "chordaidi",
            Self::Boggle => "boggle",
            Self::Bingo => "bingo",
        }
    }
}

impl fmt::Display for GameFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Shared payload pieces
// ---------------------------------------------------------------------------

/// A board coordinate. Row 0 is the top of the board as served (Black's
/// back rank for chess and xiangqi).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

/// One seat as shown in `room_update` and in game views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub name: String,
    pub color: String,
    pub connected: bool,
}

/// The winner field of `game_over`: a color string for board games, a
/// seat index for big two and boggle, a seat list for bingo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WinnerView {
    Color(String),
    Seat(usize),
    Seats(Vec<usize>),
}

// ---------------------------------------------------------------------------
// Client commands
// ---------------------------------------------------------------------------

/// Everything a client may send. Unknown command names fail to decode and
/// are answered with a generic error to the sender only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Join a room by id, or create one when `room_id` is absent
    /// (`game_type` is then required). `reconnect` marks a rejoin after a
    /// page navigation or network blip and bypasses the join rate limit.
    JoinGame {
        #[serde(default)]
        room_id: Option<String>,
        player_name: String,
        #[serde(default)]
        reconnect: bool,
        #[serde(default)]
        game_type: Option<GameFamily>,
    },

    /// Host only: start the game once enough seats are filled.
    StartGame,

    /// Chess / xiangqi: move a piece. `promotion` picks the chess
    /// promotion piece (`q`, `r`, `b`, `n`); queen when absent.
    MakeMove {
        from: Square,
        to: Square,
        #[serde(default)]
        promotion: Option<char>,
    },

    /// Big two: play a combo of card ids from the sender's hand.
    CdiPlay { card_ids: Vec<u8> },

    /// Big two: pass.
    CdiPass,

    /// Boggle: submit a word for this seat.
    BoggleSubmit { word: String },

    /// Boggle, host only: end the round early.
    BoggleEnd,

    /// Bingo, caller only: draw the next number.
    BingoCall,

    RequestUndo,
    ApproveUndo,
    DeclineUndo,
    Resign,
    Ping,
}

// ---------------------------------------------------------------------------
// Server events
// ---------------------------------------------------------------------------

/// Everything the server may emit. Event names and shapes are frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Joined {
        room_id: String,
        color: String,
        reconnected: bool,
    },
    RoomUpdate {
        players: Vec<PlayerInfo>,
        spectators: Vec<String>,
    },
    GameStarted,
    GameState(StateView),
    GameOver {
        winner: Option<WinnerView>,
        reason: String,
    },
    /// Rejection of a turn-based verb, sent to the submitter only.
    InvalidMove { reason: String },
    /// Generic rejection, sent to the submitter only.
    Error { message: String },
    BoggleAccept { word: String },
    BoggleReject { word: String, reason: String },
    BoggleCounts { submission_counts: Vec<usize> },
    UndoRequested { from: String },
    UndoDeclined,
    PlayerDisconnected { player_name: String },
    Pong,
}

// ---------------------------------------------------------------------------
// Per-family game_state views
// ---------------------------------------------------------------------------

/// The payload of `game_state`. Which shape applies is implied by the
/// room's family; card-table views are additionally personalized per seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateView {
    Board(BoardStateView),
    CardTable(CardTableStateView),
    WordRound(BoggleStateView),
    NumberGrid(NumberGridStateView),
}

/// Chess and xiangqi: everything is public.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStateView {
    pub fen: String,
    /// Side to move: `w` (white / red) or `b`.
    pub turn: char,
    pub in_check: bool,
    pub is_game_over: bool,
    /// `white`/`black`/`red`/`draw`, or null while running.
    pub winner: Option<String>,
    pub players: Vec<PlayerInfo>,
}

/// The combo currently on the table in big two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableComboView {
    #[serde(rename = "type")]
    pub combo_type: String,
    pub card_ids: Vec<u8>,
}

/// Big two, personalized per recipient: `my_hand` is present only for the
/// seat the view was built for; everyone else sees `hand_counts` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTableStateView {
    pub game_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub my_hand: Option<Vec<u8>>,
    pub hand_counts: Vec<usize>,
    pub current_seat: usize,
    pub table_combo: Option<TableComboView>,
    pub table_owner: Option<usize>,
    pub pass_count: u8,
    pub is_game_over: bool,
    pub winner: Option<usize>,
    pub players: Vec<PlayerInfo>,
}

/// One scored word in the boggle results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub unique: bool,
    pub points: u32,
}

/// Boggle. `scores` and `words` appear once the round has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoggleStateView {
    pub game_type: String,
    /// 16 board faces, row-major. `Q` stands for `QU`.
    pub board: Vec<char>,
    pub time_left: u64,
    pub submission_counts: Vec<usize>,
    pub is_game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scores: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub words: Option<Vec<Vec<WordEntry>>>,
    pub player_count: usize,
}

/// One bingo winner with the patterns that fired for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoWinnerEntry {
    pub seat: usize,
    pub types: Vec<String>,
}

/// Bingo: all cards are public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberGridStateView {
    pub game_type: String,
    pub called: Vec<u8>,
    pub last_called: Option<u8>,
    /// Per-seat 5x5 cards; 0 is the FREE center.
    pub cards: Vec<[[u8; 5]; 5]>,
    pub marked: Vec<[[bool; 5]; 5]>,
    pub is_game_over: bool,
    pub winners: Vec<BingoWinnerEntry>,
    pub caller_seat: usize,
    pub player_count: usize,
    pub players: Vec<PlayerInfo>,
}

// =========================================================================
// Tests
// =========================================================================
