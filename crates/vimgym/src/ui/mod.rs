mod puzzle_screen;

pub use puzzle_screen::PuzzleScreen;
