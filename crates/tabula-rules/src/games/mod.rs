pub(crate) mod rock_paper_scissors;
pub(crate) mod tic_tac_toe;
