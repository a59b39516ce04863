use anchor_lang::prelude::*;

use crate::error::EscrowError;
use crate::state::EscrowRecord;

/// Decode raw account bytes into an initialized record.
pub fn decode_record(data: &[u8]) -> Result<EscrowRecord> {
    let record = EscrowRecord::try_deserialize(&mut &data[..])
        .map_err(|_| error!(EscrowError::UnknownRecord))?;
    require!(record.is_initialized(), EscrowError::UnknownRecord);
    Ok(record)
}

/// A missing, empty or foreign account is `UnknownRecord`, never a
/// framework deserialization error.
pub fn load_record(info: &AccountInfo) -> Result<EscrowRecord> {
    require!(
        info.owner == &crate::ID && !info.data_is_empty(),
        EscrowError::UnknownRecord
    );
    let data = info.try_borrow_data()?;
    decode_record(&data[..])
}

/// Write the record back before any CPI runs, so a nested call observes the
/// post-transition state.
pub fn store_record(info: &AccountInfo, record: &EscrowRecord) -> Result<()> {
    let mut data = info.try_borrow_mut_data()?;
    let mut writer: &mut [u8] = &mut data[..];
    record.try_serialize(&mut writer)
}
