//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Screen content for the BBS
//!
//! Everything here is opaque styled text; the session writes it verbatim.
//! Boxes are drawn with a fixed inner width of [`BOX_WIDTH`] columns and use
//! bare `\n` line breaks, which the transports expand to `\r\n`.

use crate::telnet::ansi::{BOLD, CLEAR_SCREEN, RESET, fg};

/// Inner width of every framed box
pub const BOX_WIDTH: usize = 75;

/// Number of frames in the connect animation
pub const LOADING_FRAME_COUNT: usize = 10;

/// Clear the screen and home the cursor
pub fn clear() -> &'static str {
    CLEAR_SCREEN
}

/// Wrap `text` in a color and reset afterwards
pub fn colorize(text: &str, color: &str) -> String {
    format!("{color}{text}{RESET}")
}

fn rule(left: char, right: char) -> String {
    let mut line = String::with_capacity((BOX_WIDTH + 2) * 3);
    line.push(left);
    line.extend(std::iter::repeat_n('═', BOX_WIDTH));
    line.push(right);
    line
}

/// Pad `text` to the box width, centering it; `text` must be plain
fn centered(text: &str) -> (String, String) {
    let len = text.chars().count().min(BOX_WIDTH);
    let left = (BOX_WIDTH - len) / 2;
    let right = BOX_WIDTH - len - left;
    (" ".repeat(left), " ".repeat(right))
}

/// One-line framed title used by the sub-screens
pub fn section_header(title: &str) -> String {
    let c = fg::BRIGHT_CYAN;
    let y = fg::BRIGHT_YELLOW;
    let title = format!("« {title} »");
    let (left, right) = centered(&title);
    format!(
        "{c}{top}{RESET}\n{c}║{RESET}{left}{y}{title}{RESET}{right}{c}║{RESET}\n{c}{bottom}{RESET}\n\n",
        top = rule('╔', '╗'),
        bottom = rule('╚', '╝'),
    )
}

pub fn logo() -> String {
    let c = fg::BRIGHT_CYAN;
    let y = fg::BRIGHT_YELLOW;
    let m = fg::BRIGHT_MAGENTA;
    let g = fg::BRIGHT_GREEN;
    let r = fg::BRIGHT_RED;
    let b = fg::BRIGHT_BLUE;
    let w = fg::BRIGHT_WHITE;
    let k = fg::BRIGHT_BLACK;
    format!(
        "{c}
╔═══════════════════════════════════════════════════════════════════════════╗
║                                                                           ║
║                 {y}█████╗ {m}██╗{c}    {g}██████╗ {r}██████╗ {b}███████╗{c}                    ║
║                {y}██╔══██╗{m}██║{c}    {g}██╔══██╗{r}██╔══██╗{b}██╔════╝{c}                    ║
║                {y}███████║{m}██║{c}    {g}██████╔╝{r}██████╔╝{b}███████╗{c}                    ║
║                {y}██╔══██║{m}██║{c}    {g}██╔══██╗{r}██╔══██╗{b}╚════██║{c}                    ║
║                {y}██║  ██║{m}██║{c}    {g}██████╔╝{r}██████╔╝{b}███████║{c}                    ║
║                {y}╚═╝  ╚═╝{m}╚═╝{c}    {g}╚═════╝ {r}╚═════╝ {b}╚══════╝{c}                    ║
║                                                                           ║
║              {w}AI-Powered Bulletin Board System - Est. 2026{c}                 ║
║                  {y}« Where the 90s meet the future »{c}                        ║
║                   {k}Powered by OpenRouter (Free Tier){c}                       ║
║                                                                           ║
╚═══════════════════════════════════════════════════════════════════════════╝
{RESET}"
    )
}

/// Framed greeting shown under the logo on connect
pub fn welcome_banner() -> String {
    let c = fg::BRIGHT_CYAN;
    let w = fg::BRIGHT_WHITE;
    let text = "Welcome to AI BBS!";
    let pad = " ".repeat(BOX_WIDTH - 2 - text.len());
    format!(
        "\n{c}{top}{RESET}\n{c}║{RESET}  {w}{text}{RESET}{pad}{c}║{RESET}\n{c}{bottom}{RESET}\n\n",
        top = rule('╔', '╗'),
        bottom = rule('╚', '╝'),
    )
}

pub fn main_menu() -> String {
    let c = fg::BRIGHT_CYAN;
    let y = fg::BRIGHT_YELLOW;
    let g = fg::BRIGHT_GREEN;
    let r = fg::BRIGHT_RED;
    let w = fg::WHITE;
    let k = fg::BRIGHT_BLACK;
    format!(
        "{c}
╔═══════════════════════════════════════════════════════════════════════════╗
║                            {y}« MAIN MENU »{c}                                  ║
╠═══════════════════════════════════════════════════════════════════════════╣
║                                                                           ║
║   {g}[1]{w} Chat with AI                 {k}// Talk to the future{c}                  ║
║   {g}[2]{w} View Message Boards          {k}// Classic BBS vibes{c}                   ║
║   {g}[3]{w} ASCII Art Gallery            {k}// Retro masterpieces{c}                  ║
║   {g}[4]{w} System Information           {k}// Stats & info{c}                        ║
║   {g}[5]{w} Easter Eggs                  {k}// Find the secrets!{c}                   ║
║   {r}[Q]{w} Quit / Logoff                {k}// See you later!{c}                      ║
║                                                                           ║
╚═══════════════════════════════════════════════════════════════════════════╝
{RESET}"
    )
}

/// Status lines printed under the main menu
pub fn menu_status(handle: &str, now: &str) -> String {
    format!(
        "\n{y}Logged in as: {w}{handle}{RESET}\n{k}Current time: {now}{RESET}\n\n",
        y = fg::BRIGHT_YELLOW,
        w = fg::BRIGHT_WHITE,
        k = fg::BRIGHT_BLACK,
    )
}

pub fn chat_header() -> String {
    let m = fg::BRIGHT_MAGENTA;
    let y = fg::BRIGHT_YELLOW;
    let w = fg::WHITE;
    let k = fg::BRIGHT_BLACK;
    format!(
        "{m}
╔═══════════════════════════════════════════════════════════════════════════╗
║                         {y}« AI CHAT ROOM »{m}                                  ║
╠═══════════════════════════════════════════════════════════════════════════╣
║  {w}You are now connected to AI!{m}                                             ║
║  {k}Type your message and press ENTER. Type '/exit' to return to menu.{m}       ║
╚═══════════════════════════════════════════════════════════════════════════╝
{RESET}"
    )
}

pub fn computer_art() -> String {
    let g = fg::BRIGHT_GREEN;
    let y = fg::BRIGHT_YELLOW;
    format!(
        r"{g}
                    _______________
                   |,----------.  |\
                   ||           |=| |
                   ||          || | |
                   ||       . _o| | |
                   |`-----------' |/
                    ~~~~~~~~~~~~~~~
                 {y}« RETRO COMPUTING »{RESET}
"
    )
}

pub fn robot_art() -> String {
    let c = fg::BRIGHT_CYAN;
    let y = fg::BRIGHT_YELLOW;
    format!(
        r"{c}
              .---.
             /     \
             \.@-@./
             /`\_/`\
            //  _  \\
           | \     )|_
          /`\_`>  <_/ \
          \__/'---'\__/
       {y}« AI Assistant Ready »{RESET}
"
    )
}

pub fn goodbye(delay_secs: u64) -> String {
    let y = fg::BRIGHT_YELLOW;
    let m = fg::BRIGHT_MAGENTA;
    let c = fg::BRIGHT_CYAN;
    let w = fg::BRIGHT_WHITE;
    let g = fg::BRIGHT_GREEN;
    let notice = match delay_secs {
        0 => "Connection closing...".to_string(),
        1 => "Connection will close in 1 second...".to_string(),
        n => format!("Connection will close in {n} seconds..."),
    };
    let (left, right) = centered(&notice);
    format!(
        "{y}
╔═══════════════════════════════════════════════════════════════════════════╗
║                                                                           ║
║                     {m}Thanks for visiting AI BBS!{y}                           ║
║                                                                           ║
║                      {c}╔═══════════════════════╗{y}                            ║
║                      {c}║     {w}See you online!   {c}║{y}                            ║
║                      {c}╚═══════════════════════╝{y}                            ║
║                                                                           ║
║{left}{g}{notice}{y}{right}║
║                                                                           ║
╚═══════════════════════════════════════════════════════════════════════════╝
{RESET}"
    )
}

/// Progress bar frame `step` of the connect animation, `0..LOADING_FRAME_COUNT`
pub fn loading_frame(step: usize) -> String {
    let filled = (step + 1).min(LOADING_FRAME_COUNT);
    let empty = LOADING_FRAME_COUNT - filled;
    format!(
        "{c}[{y}{on}{k}{off}{c}]{RESET}",
        c = fg::BRIGHT_CYAN,
        y = fg::BRIGHT_YELLOW,
        k = fg::BRIGHT_BLACK,
        on = "■".repeat(filled),
        off = "□".repeat(empty),
    )
}

pub fn matrix_egg() -> String {
    let g = fg::BRIGHT_GREEN;
    let w = fg::BRIGHT_WHITE;
    let c = fg::BRIGHT_CYAN;
    format!(
        "{g}
 ╔═══════════════════════════════════════════════════════════════╗
 ║  01001000 01100101 01101100 01101100 01101111 00100001        ║
 ║  {w}You found the Matrix Easter Egg!{g}                             ║
 ║  {c}« There is no spoon »{g}                                        ║
 ╚═══════════════════════════════════════════════════════════════╝
{RESET}"
    )
}

/// Sample message board entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pub name: &'static str,
    pub posts: u32,
    pub description: &'static str,
}

/// Static board listing; nothing is persisted
pub const BOARDS: [Board; 5] = [
    Board {
        name: "General Discussion",
        posts: 42,
        description: "Talk about anything!",
    },
    Board {
        name: "Tech Talk",
        posts: 128,
        description: "Computers, coding, and more",
    },
    Board {
        name: "AI & Future",
        posts: 89,
        description: "Discuss AI and the future",
    },
    Board {
        name: "Retro Computing",
        posts: 156,
        description: "Old school tech nostalgia",
    },
    Board {
        name: "Off Topic",
        posts: 73,
        description: "Random stuff goes here",
    },
];

pub fn board_listing() -> String {
    let mut out = section_header("MESSAGE BOARDS");
    for (i, board) in BOARDS.iter().enumerate() {
        out.push_str(&format!(
            "{g}[{n}]{RESET} {w}{name:<25}{RESET} {y}({posts} posts){RESET} - {k}{desc}{RESET}\n",
            g = fg::BRIGHT_GREEN,
            w = fg::BRIGHT_WHITE,
            y = fg::BRIGHT_YELLOW,
            k = fg::BRIGHT_BLACK,
            n = i + 1,
            name = board.name,
            posts = board.posts,
            desc = board.description,
        ));
    }
    out.push_str(&format!(
        "\n{}[This is a demo - message boards coming soon!]{RESET}\n\n",
        fg::BRIGHT_BLACK
    ));
    out
}

/// One `key.......... value` row of the system information screen
pub fn info_row(key: &str, value: &str) -> String {
    format!(
        "{g}{key:.<30}{RESET} {w}{value}{RESET}\n",
        g = fg::BRIGHT_GREEN,
        w = fg::BRIGHT_WHITE,
    )
}

pub const EGG_MESSAGES: [&str; 5] = [
    "🎮 Konami Code: ↑↑↓↓←→←→BA",
    "💾 Remember to save your work on floppy disks!",
    "📞 Dial-up modem sounds: *SCREEEEECH* *BEEEP* *STATIC*",
    "🌐 You've got mail!",
    "⌨️  Press F to pay respects",
];

pub fn egg_line(message: &str) -> String {
    format!("{}★{RESET} {message}\n", fg::BRIGHT_YELLOW)
}

/// Bold highlight used for status lines
pub fn emphasize(text: &str, color: &str) -> String {
    format!("{BOLD}{color}{text}{RESET}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Remove SGR escape sequences
    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == '\x1b' {
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            } else {
                out.push(ch);
            }
        }
        out
    }

    fn assert_box_lines_aligned(screen: &str) {
        let plain = strip_ansi(screen);
        for line in plain.lines().filter(|l| l.starts_with('║') || l.starts_with('╔')) {
            assert_eq!(line.chars().count(), BOX_WIDTH + 2, "misaligned: {:?}", line);
        }
    }

    #[test]
    fn test_framed_screens_are_aligned() {
        assert_box_lines_aligned(&logo());
        assert_box_lines_aligned(&welcome_banner());
        assert_box_lines_aligned(&main_menu());
        assert_box_lines_aligned(&chat_header());
        assert_box_lines_aligned(&goodbye(3));
        assert_box_lines_aligned(&section_header("SYSTEM INFORMATION"));
    }

    #[test]
    fn test_loading_frames_fill_up() {
        let first = strip_ansi(&loading_frame(0));
        let last = strip_ansi(&loading_frame(LOADING_FRAME_COUNT - 1));
        assert_eq!(first, "[■□□□□□□□□□]");
        assert_eq!(last, "[■■■■■■■■■■]");
    }

    #[test]
    fn test_info_row_dot_padding() {
        let row = strip_ansi(&info_row("Version", "1.0.0"));
        assert_eq!(row, format!("Version{} 1.0.0\n", ".".repeat(23)));
    }

    #[test]
    fn test_board_listing_contains_every_board() {
        let listing = strip_ansi(&board_listing());
        for board in BOARDS {
            assert!(listing.contains(board.name));
            assert!(listing.contains(&format!("({} posts)", board.posts)));
        }
        assert!(listing.contains("coming soon"));
    }

    #[test]
    fn test_goodbye_mentions_delay() {
        assert!(strip_ansi(&goodbye(5)).contains("Connection will close in 5 seconds..."));
        assert!(strip_ansi(&goodbye(1)).contains("Connection will close in 1 second..."));
        assert!(strip_ansi(&goodbye(0)).contains("Connection closing..."));
        assert_box_lines_aligned(&goodbye(0));
    }
}
