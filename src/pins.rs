//! GPIO / peripheral pin assignments for the CO2 logger main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// MH-Z19B CO2 sensor — UART1
// ---------------------------------------------------------------------------

/// UART TX to the sensor RX.
pub const CO2_UART_TX_GPIO: i32 = 17;
/// UART RX from the sensor TX.
pub const CO2_UART_RX_GPIO: i32 = 16;
/// UART port number used for the sensor link.
pub const CO2_UART_PORT: u32 = 1;
/// Fixed link rate per the sensor datasheet (8N1).
pub const CO2_UART_BAUD: u32 = 9600;

// ---------------------------------------------------------------------------
// DHT22 / AM2301 climate sensor — single-wire data
// ---------------------------------------------------------------------------

/// Bidirectional data line (external 10 kΩ pull-up).
pub const DHT_DATA_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Purge fan
// ---------------------------------------------------------------------------

/// Digital output driving the fan MOSFET (active HIGH).
pub const FAN_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// DS1302 real-time clock — three-wire serial
// ---------------------------------------------------------------------------

pub const RTC_CLK_GPIO: i32 = 27;
pub const RTC_IO_GPIO: i32 = 26;
pub const RTC_RST_GPIO: i32 = 25;

// ---------------------------------------------------------------------------
// Operator wake button (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button.  RTC-capable pin so it can arm an EXT0 deep-sleep
/// wake alongside the timer wake.
pub const BUTTON_GPIO: i32 = 0;
