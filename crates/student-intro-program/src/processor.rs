//! StudentIntro Program Processor
//!
//! On-chain (BPF) instruction execution.

use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{error::StudentIntroError, instruction::StudentIntroInstruction, state::StudentIntro};

/// Process instruction
pub fn process(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = StudentIntroInstruction::unpack(instruction_data)?;

    match instruction {
        StudentIntroInstruction::AddStudentIntro { name, message } => {
            process_add_student_intro(program_id, accounts, name, message)
        }
        StudentIntroInstruction::UpdateStudentIntro { name, message } => {
            process_update_student_intro(program_id, accounts, name, message)
        }
        StudentIntroInstruction::Close => process_close(program_id, accounts),
    }
}

/// Create the intro account
fn process_add_student_intro(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    name: String,
    message: String,
) -> ProgramResult {
    msg!("Add student intro");
    msg!("Name: {}", name);
    msg!("Message: {}", message);

    let accounts_iter = &mut accounts.iter();
    let intro_account = next_account_info(accounts_iter)?;
    let student = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;

    let bump = verify_student_pda(program_id, intro_account, student)?;

    if intro_account.owner == program_id {
        return Err(StudentIntroError::AccountAlreadyInitialized.into());
    }

    let space = StudentIntro::checked_space(&name, &message)?;
    let required = Rent::get()?.minimum_balance(space);
    let bump_seed = [bump];
    let intro_seeds: &[&[u8]] = &[student.key.as_ref(), &bump_seed];
    let current = intro_account.lamports();

    if current == 0 {
        invoke_signed(
            &system_instruction::create_account(
                student.key,
                intro_account.key,
                required,
                space as u64,
                program_id,
            ),
            &[student.clone(), intro_account.clone(), system_program.clone()],
            &[intro_seeds],
        )?;
    } else {
        // Someone already sent lamports to the PDA, so create_account would fail
        let shortfall = required.saturating_sub(current);
        if shortfall > 0 {
            invoke(
                &system_instruction::transfer(student.key, intro_account.key, shortfall),
                &[student.clone(), intro_account.clone(), system_program.clone()],
            )?;
        }
        invoke_signed(
            &system_instruction::allocate(intro_account.key, space as u64),
            &[intro_account.clone(), system_program.clone()],
            &[intro_seeds],
        )?;
        invoke_signed(
            &system_instruction::assign(intro_account.key, program_id),
            &[intro_account.clone(), system_program.clone()],
            &[intro_seeds],
        )?;
    }

    let intro = StudentIntro {
        student: *student.key,
        name,
        message,
    };
    intro.pack_into(&mut intro_account.data.borrow_mut())?;

    Ok(())
}

/// Rewrite the intro, resizing the account and settling rent with the student
fn process_update_student_intro(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    name: String,
    message: String,
) -> ProgramResult {
    msg!("Update student intro");
    msg!("Name: {}", name);
    msg!("Message: {}", message);

    let accounts_iter = &mut accounts.iter();
    let intro_account = next_account_info(accounts_iter)?;
    let student = next_account_info(accounts_iter)?;
    let system_program = next_account_info(accounts_iter)?;

    verify_student_pda(program_id, intro_account, student)?;
    load_owned_intro(program_id, intro_account, student)?;

    let space = StudentIntro::checked_space(&name, &message)?;
    let required = Rent::get()?.minimum_balance(space);
    let current = intro_account.lamports();

    if required > current {
        invoke(
            &system_instruction::transfer(student.key, intro_account.key, required - current),
            &[student.clone(), intro_account.clone(), system_program.clone()],
        )?;
    } else if current > required {
        let excess = current - required;
        **intro_account.try_borrow_mut_lamports()? = required;
        let refunded = student
            .lamports()
            .checked_add(excess)
            .ok_or(StudentIntroError::ArithmeticOverflow)?;
        **student.try_borrow_mut_lamports()? = refunded;
    }

    intro_account.realloc(space, false)?;

    let intro = StudentIntro {
        student: *student.key,
        name,
        message,
    };
    intro.pack_into(&mut intro_account.data.borrow_mut())?;

    Ok(())
}

/// Close the intro account
fn process_close(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    msg!("Close student intro");

    let accounts_iter = &mut accounts.iter();
    let intro_account = next_account_info(accounts_iter)?;
    let student = next_account_info(accounts_iter)?;

    verify_student_pda(program_id, intro_account, student)?;
    load_owned_intro(program_id, intro_account, student)?;

    let balance = student
        .lamports()
        .checked_add(intro_account.lamports())
        .ok_or(StudentIntroError::ArithmeticOverflow)?;
    **student.try_borrow_mut_lamports()? = balance;
    **intro_account.try_borrow_mut_lamports()? = 0;

    intro_account.realloc(0, false)?;
    intro_account.assign(&system_program::id());

    Ok(())
}

/// Check the student signed and the intro account is the student's PDA.
/// Returns the PDA bump.
fn verify_student_pda(
    program_id: &Pubkey,
    intro_account: &AccountInfo,
    student: &AccountInfo,
) -> Result<u8, ProgramError> {
    if !student.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let (pda, bump) = StudentIntro::derive_pda(student.key, program_id);
    if pda != *intro_account.key {
        msg!("Invalid seeds for PDA");
        return Err(StudentIntroError::InvalidPda.into());
    }

    Ok(bump)
}

/// Load an existing intro and check it belongs to the signing student
fn load_owned_intro(
    program_id: &Pubkey,
    intro_account: &AccountInfo,
    student: &AccountInfo,
) -> Result<StudentIntro, ProgramError> {
    if intro_account.owner != program_id {
        if intro_account.data_is_empty() {
            return Err(StudentIntroError::AccountNotInitialized.into());
        }
        return Err(StudentIntroError::InvalidAccountOwner.into());
    }

    let intro = StudentIntro::unpack(&intro_account.data.borrow())?;
    if intro.student != *student.key {
        return Err(StudentIntroError::InvalidAuthority.into());
    }

    Ok(intro)
}
