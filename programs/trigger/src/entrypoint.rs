//! Program entrypoint

use pinocchio::{
    account_info::AccountInfo,
    entrypoint,
    msg,
    pubkey::Pubkey,
    ProgramResult,
};
use pinocchio_log::log;

use crate::instructions::{
    process_commit, process_initialize, process_initialize_pledger, process_trigger,
    process_withdraw, TriggerInstruction,
};
use crate::state::{Pledger, Treasury, TriggerBook, TreasuryPayload};
use cascade_common::{
    borrow_account_data_mut, validate_owner, validate_signer, validate_writable, CascadeError,
    InstructionReader,
};

/// Most levels accepted in one trigger batch
pub const MAX_BATCH_LEVELS: usize = 32;

entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    if instruction_data.is_empty() {
        msg!("Error: Instruction data is empty");
        return Err(CascadeError::InvalidInstruction.into());
    }

    let discriminator = instruction_data[0];
    let instruction = match discriminator {
        0 => TriggerInstruction::Initialize,
        1 => TriggerInstruction::InitializePledger,
        2 => TriggerInstruction::Commit,
        3 => TriggerInstruction::Withdraw,
        4 => TriggerInstruction::Trigger,
        _ => {
            msg!("Error: Unknown instruction");
            return Err(CascadeError::InvalidInstruction.into());
        }
    };

    let data = &instruction_data[1..];
    match instruction {
        TriggerInstruction::Initialize => {
            msg!("Instruction: Initialize");
            process_initialize_inner(program_id, accounts, data)
        }
        TriggerInstruction::InitializePledger => {
            msg!("Instruction: InitializePledger");
            process_initialize_pledger_inner(program_id, accounts, data)
        }
        TriggerInstruction::Commit => {
            msg!("Instruction: Commit");
            process_commit_inner(program_id, accounts, data)
        }
        TriggerInstruction::Withdraw => {
            msg!("Instruction: Withdraw");
            process_withdraw_inner(program_id, accounts, data)
        }
        TriggerInstruction::Trigger => {
            msg!("Instruction: Trigger");
            process_trigger_inner(program_id, accounts, data)
        }
    }
}

/// Process initialize instruction
///
/// Expected accounts:
/// 0. `[writable]` Book account (PDA)
/// 1. `[writable]` Treasury account (PDA)
/// 2. `[signer]` Authority
///
/// Expected data layout (42 bytes):
/// - authority: Pubkey (32 bytes)
/// - max_size: u64 (8 bytes, 0 = unbounded)
/// - fee_bps: u16 (2 bytes)
fn process_initialize_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: Initialize requires 3 accounts");
        return Err(CascadeError::InvalidInstruction.into());
    }

    let book_account = &accounts[0];
    let treasury_account = &accounts[1];
    let authority_account = &accounts[2];

    validate_owner(book_account, program_id)?;
    validate_writable(book_account)?;
    validate_owner(treasury_account, program_id)?;
    validate_writable(treasury_account)?;
    validate_signer(authority_account)?;

    let mut reader = InstructionReader::new(data);
    let authority = Pubkey::from(reader.read_bytes::<32>()?);
    let max_size = reader.read_u64()?;
    let fee_bps = reader.read_u16()?;

    if authority_account.key() != &authority {
        msg!("Error: Authority account does not match instruction data");
        return Err(CascadeError::InvalidAccount.into());
    }

    process_initialize(
        program_id,
        book_account,
        treasury_account,
        &authority,
        max_size,
        fee_bps,
    )?;
    Ok(())
}

/// Process initialize pledger instruction
///
/// Expected accounts:
/// 0. `[writable]` Pledger account (PDA)
/// 1. `[]` Book account
/// 2. `[signer]` User
///
/// Expected data layout (32 bytes):
/// - user: Pubkey (32 bytes)
fn process_initialize_pledger_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: InitializePledger requires 3 accounts");
        return Err(CascadeError::InvalidInstruction.into());
    }

    let pledger_account = &accounts[0];
    let book_account = &accounts[1];
    let user_account = &accounts[2];

    validate_owner(pledger_account, program_id)?;
    validate_writable(pledger_account)?;
    validate_owner(book_account, program_id)?;
    validate_signer(user_account)?;

    let mut reader = InstructionReader::new(data);
    let user = Pubkey::from(reader.read_bytes::<32>()?);

    if user_account.key() != &user {
        msg!("Error: User account does not match instruction data");
        return Err(CascadeError::InvalidAccount.into());
    }

    process_initialize_pledger(program_id, pledger_account, book_account, &user)?;
    Ok(())
}

/// Borrow and cross-check the book / treasury / pledger triple shared by
/// the state-mutating instructions.
fn load_ledger_accounts<'a>(
    program_id: &Pubkey,
    book_account: &'a AccountInfo,
    treasury_account: &'a AccountInfo,
) -> Result<(&'a mut TriggerBook, &'a mut Treasury), CascadeError> {
    validate_owner(book_account, program_id)?;
    validate_writable(book_account)?;
    validate_owner(treasury_account, program_id)?;
    validate_writable(treasury_account)?;

    let book = unsafe { borrow_account_data_mut::<TriggerBook>(book_account)? };
    if !book.validate() {
        msg!("Error: invalid book account");
        return Err(CascadeError::InvalidAccount);
    }
    let treasury = unsafe { borrow_account_data_mut::<Treasury>(treasury_account)? };
    if !treasury.validate() {
        msg!("Error: invalid treasury account");
        return Err(CascadeError::InvalidAccount);
    }
    if &book.treasury != treasury_account.key() || &treasury.book != book_account.key() {
        msg!("Error: book and treasury do not belong together");
        return Err(CascadeError::InvalidAccount);
    }
    Ok((book, treasury))
}

fn load_pledger<'a>(
    program_id: &Pubkey,
    pledger_account: &'a AccountInfo,
    book_key: &Pubkey,
    user_key: &Pubkey,
) -> Result<&'a mut Pledger, CascadeError> {
    validate_owner(pledger_account, program_id)?;
    validate_writable(pledger_account)?;
    let pledger = unsafe { borrow_account_data_mut::<Pledger>(pledger_account)? };
    if !pledger.validate() {
        msg!("Error: invalid pledger account");
        return Err(CascadeError::InvalidAccount);
    }
    if &pledger.book != book_key {
        msg!("Error: pledger belongs to a different book");
        return Err(CascadeError::InvalidAccount);
    }
    if &pledger.user != user_key {
        return Err(CascadeError::Unauthorized);
    }
    Ok(pledger)
}

/// Process commit instruction
///
/// Expected accounts:
/// 0. `[writable]` Book account
/// 1. `[writable]` Treasury account
/// 2. `[writable]` Pledger account
/// 3. `[signer]` Committer
///
/// Expected data layout (32 bytes):
/// - level: u64 (8 bytes)
/// - size: u64 (8 bytes)
/// - payment: u128 (16 bytes)
fn process_commit_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: Commit requires 4 accounts");
        return Err(CascadeError::InvalidInstruction.into());
    }

    let book_account = &accounts[0];
    let treasury_account = &accounts[1];
    let pledger_account = &accounts[2];
    let committer_account = &accounts[3];

    validate_signer(committer_account)?;
    let (book, treasury) = load_ledger_accounts(program_id, book_account, treasury_account)?;
    let pledger = load_pledger(
        program_id,
        pledger_account,
        book_account.key(),
        committer_account.key(),
    )?;

    let mut reader = InstructionReader::new(data);
    let level = reader.read_u64()?;
    let size = reader.read_u64()?;
    let payment = reader.read_u128()?;

    let mut payload = TreasuryPayload::new(treasury, book.max_size);
    let id = process_commit(
        book,
        pledger,
        &mut payload,
        committer_account.key(),
        level,
        size,
        payment,
    )?;

    log!("commitment id {}", id);
    Ok(())
}

/// Process withdraw instruction
///
/// Expected accounts:
/// 0. `[writable]` Book account
/// 1. `[writable]` Treasury account
/// 2. `[writable]` Pledger account
/// 3. `[signer]` Committer
///
/// Expected data layout (4 bytes):
/// - id: u32 (4 bytes)
fn process_withdraw_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: Withdraw requires 4 accounts");
        return Err(CascadeError::InvalidInstruction.into());
    }

    let book_account = &accounts[0];
    let treasury_account = &accounts[1];
    let pledger_account = &accounts[2];
    let committer_account = &accounts[3];

    validate_signer(committer_account)?;
    let (book, treasury) = load_ledger_accounts(program_id, book_account, treasury_account)?;
    let pledger = load_pledger(
        program_id,
        pledger_account,
        book_account.key(),
        committer_account.key(),
    )?;

    let mut reader = InstructionReader::new(data);
    let id = reader.read_u32()?;

    let mut payload = TreasuryPayload::new(treasury, book.max_size);
    process_withdraw(book, pledger, &mut payload, committer_account.key(), id)?;

    msg!("Withdraw processed successfully");
    Ok(())
}

/// Process trigger instruction
///
/// Expected accounts:
/// 0. `[writable]` Book account
/// 1. `[writable]` Treasury account
/// 2. `[signer]` Caller (receives the fee payout)
///
/// Expected data layout (1 + 8*count bytes):
/// - count: u8 (1 byte, 1..=32)
/// - levels: count * u64 (strictly increasing)
fn process_trigger_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: Trigger requires 3 accounts");
        return Err(CascadeError::InvalidInstruction.into());
    }

    let book_account = &accounts[0];
    let treasury_account = &accounts[1];
    let caller_account = &accounts[2];

    validate_signer(caller_account)?;
    let (book, treasury) = load_ledger_accounts(program_id, book_account, treasury_account)?;

    let mut reader = InstructionReader::new(data);
    let count = reader.read_u8()? as usize;
    if count == 0 || count > MAX_BATCH_LEVELS {
        msg!("Error: bad trigger batch length");
        return Err(CascadeError::InvalidInstruction.into());
    }
    let mut levels = [0u64; MAX_BATCH_LEVELS];
    for slot in levels.iter_mut().take(count) {
        *slot = reader.read_u64()?;
    }

    let mut payload = TreasuryPayload::new(treasury, book.max_size);
    let payout = process_trigger(book, &mut payload, caller_account.key(), &levels[..count])?;

    log!("trigger payout {}", payout);
    Ok(())
}
