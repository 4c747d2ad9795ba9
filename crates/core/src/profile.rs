//! Active profile selection.
//!
//! Commands:
//!   - 0x82 getProfile → reply[1] = active profile id
//!   - 0x02 setProfile(profile id)
//!
//! Profile contents live in the per-profile config and button blobs
//! (see [`crate::config`] and [`crate::buttons`]).

use crate::command::{ids, NO_ARGS};
use crate::error::Result;
use crate::safety;
use crate::transport::{get_command, set_command, HidTransport};
use tracing::info;

/// Read the active profile id.
pub fn read_active_profile(transport: &dyn HidTransport) -> Result<u8> {
    let reply = get_command(transport, ids::GET_PROFILE, &NO_ARGS)?;
    Ok(reply[1])
}

/// Switch the active profile.
pub fn write_active_profile(transport: &dyn HidTransport, profile_id: u8) -> Result<()> {
    safety::validate_profile_id(profile_id)?;
    info!(profile_id, "Switching active profile");
    set_command(transport, ids::SET_PROFILE, &[profile_id, 0, 0, 0, 0, 0])
}
