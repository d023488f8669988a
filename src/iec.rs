/*!
The IEC serial bus: three shared lines (ATN, CLK, DATA) driven open-collector
by the main C64 (through CIA2 port A) and by up to four 1541 drives (through
each drive's VIA). A line reads LOW iff at least one driver asserts LOW;
otherwise it is pulled HIGH. This is the classic wired-AND discipline.

Grounded in the teacher's `bus.rs::tick` IRQ-OR-of-sources pattern
(`self.irq_line = self.apu.irq_asserted() || mapper_irq`), generalized from a
2-way OR of IRQ sources to an N-way OR-of-asserted (equivalently, AND of
released) over a fixed array of drivers.
*/

pub const MAIN_CPU_DRIVER: usize = 0;
pub const MAX_DRIVERS: usize = 5; // main C64 + up to 4 drives (devices 8-11)

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IecLine {
    Atn,
    Clk,
    Data,
}

#[derive(Clone, Debug)]
pub struct IecBus {
    atn: [bool; MAX_DRIVERS],
    clk: [bool; MAX_DRIVERS],
    data: [bool; MAX_DRIVERS],
}

impl Default for IecBus {
    fn default() -> Self {
        Self::new()
    }
}

impl IecBus {
    pub fn new() -> Self {
        IecBus {
            atn: [false; MAX_DRIVERS],
            clk: [false; MAX_DRIVERS],
            data: [false; MAX_DRIVERS],
        }
    }

    fn lines_mut(&mut self, line: IecLine) -> &mut [bool; MAX_DRIVERS] {
        match line {
            IecLine::Atn => &mut self.atn,
            IecLine::Clk => &mut self.clk,
            IecLine::Data => &mut self.data,
        }
    }

    fn lines(&self, line: IecLine) -> &[bool; MAX_DRIVERS] {
        match line {
            IecLine::Atn => &self.atn,
            IecLine::Clk => &self.clk,
            IecLine::Data => &self.data,
        }
    }

    /// A driver asserts (pulls low, `asserted = true`) or releases a line.
    pub fn set(&mut self, driver: usize, line: IecLine, asserted: bool) {
        self.lines_mut(line)[driver] = asserted;
    }

    /// True if the bus reads LOW (asserted) on this line: at least one
    /// driver is pulling it down.
    pub fn is_asserted(&self, line: IecLine) -> bool {
        self.lines(line).iter().any(|&a| a)
    }

    /// True if the bus reads HIGH (released): no driver asserts.
    pub fn is_released(&self, line: IecLine) -> bool {
        !self.is_asserted(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wired_and_over_all_nonempty_subsets() {
        // 5 drivers; exhaustively check every nonempty subset asserting DATA.
        for mask in 1u32..(1 << MAX_DRIVERS) {
            let mut bus = IecBus::new();
            for driver in 0..MAX_DRIVERS {
                if mask & (1 << driver) != 0 {
                    bus.set(driver, IecLine::Data, true);
                }
            }
            assert!(bus.is_asserted(IecLine::Data), "mask={mask:#b}");
        }
    }

    #[test]
    fn released_when_no_driver_asserts() {
        let bus = IecBus::new();
        assert!(bus.is_released(IecLine::Atn));
        assert!(bus.is_released(IecLine::Clk));
        assert!(bus.is_released(IecLine::Data));
    }

    #[test]
    fn one_driver_releasing_does_not_release_bus() {
        let mut bus = IecBus::new();
        bus.set(0, IecLine::Clk, true);
        bus.set(1, IecLine::Clk, true);
        bus.set(0, IecLine::Clk, false);
        assert!(bus.is_asserted(IecLine::Clk));
    }
}
