//! Native Builtin Entrypoint for StudentIntro
//!
//! Lets the program run as a native Rust builtin inside the in-process SVM
//! instead of as BPF bytecode. Shares state, instruction and error code with
//! the BPF processor; only account access differs.

use solana_program::{
    instruction::InstructionError, pubkey::Pubkey, system_instruction, system_program,
};
use solana_log_collector::ic_msg;
use solana_program_runtime::{declare_process_instruction, invoke_context::InvokeContext};
use solana_sdk::transaction_context::IndexOfAccount;

use crate::{
    constants::BUILTIN_COMPUTE_UNITS, error::StudentIntroError,
    instruction::StudentIntroInstruction, state::StudentIntro,
};

const INTRO_INDEX: IndexOfAccount = 0;
const STUDENT_INDEX: IndexOfAccount = 1;

declare_process_instruction!(Entrypoint, BUILTIN_COMPUTE_UNITS, |invoke_context| {
    process_instruction(invoke_context)
});

/// Process a StudentIntro instruction
fn process_instruction(invoke_context: &mut InvokeContext) -> Result<(), InstructionError> {
    let instruction = {
        let transaction_context = &*invoke_context.transaction_context;
        let instruction_context = transaction_context.get_current_instruction_context()?;
        StudentIntroInstruction::unpack(instruction_context.get_instruction_data())?
    };

    match instruction {
        StudentIntroInstruction::AddStudentIntro { name, message } => {
            process_add_student_intro(invoke_context, name, message)
        }
        StudentIntroInstruction::UpdateStudentIntro { name, message } => {
            process_update_student_intro(invoke_context, name, message)
        }
        StudentIntroInstruction::Close => process_close(invoke_context),
    }
}

/// Account keys and intro state read up front.
/// No account borrows may be held across `native_invoke`.
struct IntroAccounts {
    program_id: Pubkey,
    intro: Pubkey,
    student: Pubkey,
    intro_owner: Pubkey,
    intro_lamports: u64,
    intro_data: Vec<u8>,
}

impl IntroAccounts {
    /// Existing intro that belongs to the signing student
    fn owned_intro(&self) -> Result<StudentIntro, InstructionError> {
        if self.intro_owner != self.program_id {
            if self.intro_data.is_empty() {
                return Err(StudentIntroError::AccountNotInitialized.into());
            }
            return Err(StudentIntroError::InvalidAccountOwner.into());
        }

        let intro = StudentIntro::unpack(&self.intro_data)?;
        if intro.student != self.student {
            return Err(StudentIntroError::InvalidAuthority.into());
        }
        Ok(intro)
    }
}

/// Read the intro/student accounts, checking signer and PDA
fn load_accounts(
    invoke_context: &InvokeContext,
    min_accounts: IndexOfAccount,
) -> Result<IntroAccounts, InstructionError> {
    let transaction_context = &*invoke_context.transaction_context;
    let instruction_context = transaction_context.get_current_instruction_context()?;
    instruction_context.check_number_of_instruction_accounts(min_accounts)?;

    let program_id = *instruction_context.get_last_program_key(transaction_context)?;

    let intro_account =
        instruction_context.try_borrow_instruction_account(transaction_context, INTRO_INDEX)?;
    let student_account =
        instruction_context.try_borrow_instruction_account(transaction_context, STUDENT_INDEX)?;

    if !student_account.is_signer() {
        return Err(InstructionError::MissingRequiredSignature);
    }

    let (expected_pda, _) = StudentIntro::derive_pda(student_account.get_key(), &program_id);
    if expected_pda != *intro_account.get_key() {
        return Err(StudentIntroError::InvalidPda.into());
    }

    Ok(IntroAccounts {
        program_id,
        intro: *intro_account.get_key(),
        student: *student_account.get_key(),
        intro_owner: *intro_account.get_owner(),
        intro_lamports: intro_account.get_lamports(),
        intro_data: intro_account.get_data().to_vec(),
    })
}

/// Create the intro account
fn process_add_student_intro(
    invoke_context: &mut InvokeContext,
    name: String,
    message: String,
) -> Result<(), InstructionError> {
    ic_msg!(invoke_context, "Add student intro");
    ic_msg!(invoke_context, "Name: {}", name);
    ic_msg!(invoke_context, "Message: {}", message);

    let accounts = load_accounts(invoke_context, 3)?;
    if accounts.intro_owner == accounts.program_id {
        return Err(StudentIntroError::AccountAlreadyInitialized.into());
    }

    let space = StudentIntro::checked_space(&name, &message)?;
    create_intro_account(invoke_context, &accounts, space)?;

    let intro = StudentIntro {
        student: accounts.student,
        name,
        message,
    };

    let transaction_context = &*invoke_context.transaction_context;
    let instruction_context = transaction_context.get_current_instruction_context()?;
    let mut intro_account =
        instruction_context.try_borrow_instruction_account(transaction_context, INTRO_INDEX)?;
    intro_account.set_data_from_slice(&intro.pack())
}

/// Fund, allocate and assign the intro PDA.
///
/// `create_account` refuses an address that already holds lamports, so a
/// prefunded PDA is topped up to rent exemption and then allocated and
/// assigned in place.
fn create_intro_account(
    invoke_context: &mut InvokeContext,
    accounts: &IntroAccounts,
    space: usize,
) -> Result<(), InstructionError> {
    let required = invoke_context
        .get_sysvar_cache()
        .get_rent()?
        .minimum_balance(space);

    // The intro PDA signs for its own creation
    if accounts.intro_lamports == 0 {
        return invoke_context.native_invoke(
            system_instruction::create_account(
                &accounts.student,
                &accounts.intro,
                required,
                space as u64,
                &accounts.program_id,
            )
            .into(),
            &[accounts.intro],
        );
    }

    let shortfall = required.saturating_sub(accounts.intro_lamports);
    if shortfall > 0 {
        invoke_context.native_invoke(
            system_instruction::transfer(&accounts.student, &accounts.intro, shortfall).into(),
            &[accounts.student],
        )?;
    }
    invoke_context.native_invoke(
        system_instruction::allocate(&accounts.intro, space as u64).into(),
        &[accounts.intro],
    )?;
    invoke_context.native_invoke(
        system_instruction::assign(&accounts.intro, &accounts.program_id).into(),
        &[accounts.intro],
    )
}

/// Rewrite the intro, resizing the account and settling rent with the student
fn process_update_student_intro(
    invoke_context: &mut InvokeContext,
    name: String,
    message: String,
) -> Result<(), InstructionError> {
    ic_msg!(invoke_context, "Update student intro");
    ic_msg!(invoke_context, "Name: {}", name);
    ic_msg!(invoke_context, "Message: {}", message);

    let accounts = load_accounts(invoke_context, 3)?;
    accounts.owned_intro()?;

    let space = StudentIntro::checked_space(&name, &message)?;
    let required = invoke_context
        .get_sysvar_cache()
        .get_rent()?
        .minimum_balance(space);

    if required > accounts.intro_lamports {
        invoke_context.native_invoke(
            system_instruction::transfer(
                &accounts.student,
                &accounts.intro,
                required - accounts.intro_lamports,
            )
            .into(),
            &[accounts.student],
        )?;
    }

    let intro = StudentIntro {
        student: accounts.student,
        name,
        message,
    };

    let transaction_context = &*invoke_context.transaction_context;
    let instruction_context = transaction_context.get_current_instruction_context()?;
    let mut intro_account =
        instruction_context.try_borrow_instruction_account(transaction_context, INTRO_INDEX)?;

    let current = intro_account.get_lamports();
    if current > required {
        let excess = current - required;
        intro_account.checked_sub_lamports(excess)?;
        let mut student_account =
            instruction_context.try_borrow_instruction_account(transaction_context, STUDENT_INDEX)?;
        student_account.checked_add_lamports(excess)?;
    }

    intro_account.set_data_from_slice(&intro.pack())
}

/// Close the intro account
fn process_close(invoke_context: &mut InvokeContext) -> Result<(), InstructionError> {
    ic_msg!(invoke_context, "Close student intro");

    let accounts = load_accounts(invoke_context, 2)?;
    accounts.owned_intro()?;

    let transaction_context = &*invoke_context.transaction_context;
    let instruction_context = transaction_context.get_current_instruction_context()?;
    let mut intro_account =
        instruction_context.try_borrow_instruction_account(transaction_context, INTRO_INDEX)?;
    let mut student_account =
        instruction_context.try_borrow_instruction_account(transaction_context, STUDENT_INDEX)?;

    let lamports = intro_account.get_lamports();
    intro_account.checked_sub_lamports(lamports)?;
    student_account.checked_add_lamports(lamports)?;

    // Data must be empty before ownership can go back to the system program
    intro_account.set_data_length(0)?;
    intro_account.set_owner(system_program::id().as_ref())?;

    Ok(())
}
