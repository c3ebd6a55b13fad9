//! Exception vectors bound through `cortex-m-rt`

use cortex_m_rt::exception;

#[exception]
fn SysTick() {
    hal_ti::systick::on_systick();
}
