//! Side light and blink commands.

use crate::command::{ids, NO_ARGS};
use crate::config::Rgb;
use crate::error::Result;
use crate::transport::{get_command, set_command, HidTransport};

/// Read whether the side light is on (bit 0 of reply[1]).
pub fn read_side_light(transport: &dyn HidTransport) -> Result<bool> {
    let reply = get_command(transport, ids::GET_SIDE_LIGHT, &NO_ARGS)?;
    Ok(reply[1] & 1 != 0)
}

/// Turn the side light on or off.
pub fn write_side_light(transport: &dyn HidTransport, on: bool) -> Result<()> {
    set_command(transport, ids::SET_SIDE_LIGHT, &[u8::from(on), 0, 0, 0, 0, 0])
}

/// Blink the lights `count` times in `color`, `delay` firmware ticks apart.
pub fn blink_lights(transport: &dyn HidTransport, color: Rgb, delay: u8, count: u8) -> Result<()> {
    set_command(
        transport,
        ids::BLINK_LIGHTS,
        &[color.r, color.g, color.b, delay, count, 0],
    )
}
