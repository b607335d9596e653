//! One-shot hardware peripheral initialization and low-level helpers.
//!
//! Configures the sensor UART and every GPIO using raw ESP-IDF sys calls.
//! Called once from `main()` before the controller loop starts.  The
//! microsecond-timing helpers (`delay_us`, `wait_level`) back the DS1302
//! bit-bang bus and the DHT22 single-wire transfer.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    UartInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UartInitFailed(rc) => write!(f, "UART init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the controller loop;
    // single-threaded at this point.
    unsafe {
        init_uart()?;
        init_gpio()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── UART (sensor link) ───────────────────────────────────────

#[cfg(target_os = "espidf")]
const UART_RX_BUF: i32 = 1024;

#[cfg(target_os = "espidf")]
unsafe fn init_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::CO2_UART_BAUD as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    let port = pins::CO2_UART_PORT as i32;

    let ret = unsafe { uart_param_config(port, &cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::UartInitFailed(ret));
    }
    let ret = unsafe {
        uart_set_pin(
            port,
            pins::CO2_UART_TX_GPIO,
            pins::CO2_UART_RX_GPIO,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
        )
    };
    if ret != ESP_OK {
        return Err(HwInitError::UartInitFailed(ret));
    }
    let ret = unsafe {
        uart_driver_install(port, UART_RX_BUF, 0, 0, core::ptr::null_mut(), 0)
    };
    if ret != ESP_OK {
        return Err(HwInitError::UartInitFailed(ret));
    }

    info!(
        "hw_init: UART{} configured (tx={}, rx={}, {} 8N1)",
        port,
        pins::CO2_UART_TX_GPIO,
        pins::CO2_UART_RX_GPIO,
        pins::CO2_UART_BAUD
    );
    Ok(())
}

/// Write one sensor command frame.  Returns `false` on a short write.
#[cfg(target_os = "espidf")]
pub fn uart_write(data: &[u8]) -> bool {
    // SAFETY: the UART driver was installed during init_uart().
    let written = unsafe {
        uart_write_bytes(
            pins::CO2_UART_PORT as i32,
            data.as_ptr().cast(),
            data.len(),
        )
    };
    written == data.len() as i32
}

/// Read up to `buf.len()` bytes, waiting at most `timeout_ms`.
/// Returns the number of bytes received.
#[cfg(target_os = "espidf")]
pub fn uart_read(buf: &mut [u8], timeout_ms: u32) -> usize {
    // SAFETY: reads into a caller-owned buffer through the installed driver.
    let got = unsafe {
        uart_read_bytes(
            pins::CO2_UART_PORT as i32,
            buf.as_mut_ptr().cast(),
            buf.len() as u32,
            timeout_ms / portTICK_PERIOD_MS,
        )
    };
    got.max(0) as usize
}

/// Drop stale bytes so the next response is framed from byte zero.
#[cfg(target_os = "espidf")]
pub fn uart_flush_input() {
    // SAFETY: driver installed during init.
    unsafe {
        esp_idf_svc::sys::uart_flush_input(pins::CO2_UART_PORT as i32);
    }
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio() -> Result<(), HwInitError> {
    // Outputs: fan, RTC clock and reset lines.  All start low.
    let out_cfg = gpio_config_t {
        pin_bit_mask: (1u64 << pins::FAN_GPIO)
            | (1u64 << pins::RTC_CLK_GPIO)
            | (1u64 << pins::RTC_RST_GPIO),
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&out_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    for pin in [pins::FAN_GPIO, pins::RTC_CLK_GPIO, pins::RTC_RST_GPIO] {
        // SAFETY: pins configured as outputs just above.
        unsafe {
            gpio_set_level(pin, 0);
        }
    }

    // Wake button input (active low, external pull-up present).
    let btn_cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&btn_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    // The DHT data pin switches direction at runtime; start as input.
    gpio_set_input(pins::DHT_DATA_GPIO);

    info!("hw_init: GPIO configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: register write on an already-configured output pin.
    unsafe {
        gpio_set_level(pin, i32::from(high) as u32);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_set_output(pin: i32) {
    // SAFETY: direction change on a valid pin number.
    unsafe {
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_OUTPUT);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_set_output(_pin: i32) {}

#[cfg(target_os = "espidf")]
pub fn gpio_set_input(pin: i32) {
    // SAFETY: direction change on a valid pin number.
    unsafe {
        gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_set_input(_pin: i32) {}

// ── Microsecond timing ────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn delay_us(us: u32) {
    // SAFETY: busy-wait in ROM code; no shared state.
    unsafe {
        esp_rom_delay_us(us);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn delay_us(_us: u32) {}

/// Busy-wait until `pin` reads `level`, at most `timeout_us`.
/// Returns the elapsed microseconds, or `None` on timeout.  Only used for
/// the sub-millisecond windows of the DHT transfer.
#[cfg(target_os = "espidf")]
pub fn wait_level(pin: i32, level: bool, timeout_us: u32) -> Option<u32> {
    // SAFETY: esp_timer_get_time is a monotonic read.
    let start = unsafe { esp_timer_get_time() };
    loop {
        let now = unsafe { esp_timer_get_time() };
        let elapsed = (now - start) as u32;
        if gpio_read(pin) == level {
            return Some(elapsed);
        }
        if elapsed > timeout_us {
            return None;
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn wait_level(_pin: i32, _level: bool, _timeout_us: u32) -> Option<u32> {
    None
}
