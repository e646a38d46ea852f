//! PDA derivation for program accounts

use pinocchio::pubkey::{find_program_address, Pubkey};

/// Trigger book PDA: ["book", authority]
pub fn derive_book_pda(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
    find_program_address(&[b"book", authority.as_ref()], program_id)
}

/// Treasury PDA: ["treasury", book]
pub fn derive_treasury_pda(program_id: &Pubkey, book: &Pubkey) -> (Pubkey, u8) {
    find_program_address(&[b"treasury", book.as_ref()], program_id)
}

/// Pledger PDA: ["pledger", book, user]
pub fn derive_pledger_pda(program_id: &Pubkey, book: &Pubkey, user: &Pubkey) -> (Pubkey, u8) {
    find_program_address(&[b"pledger", book.as_ref(), user.as_ref()], program_id)
}
