//! One I2C bus shared by several probes of the control loop.
//!
//! The heater and filament SHT3x sit on the same bus.  Both live in the
//! sensor hub, which runs on a single task, so a `RefCell` is enough.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::i2c::{ErrorType, I2c, Operation};

pub struct SharedI2c<I> {
    bus: Rc<RefCell<I>>,
}

impl<I> SharedI2c<I> {
    pub fn new(bus: I) -> Self {
        Self {
            bus: Rc::new(RefCell::new(bus)),
        }
    }
}

impl<I> Clone for SharedI2c<I> {
    fn clone(&self) -> Self {
        Self {
            bus: Rc::clone(&self.bus),
        }
    }
}

impl<I: I2c> ErrorType for SharedI2c<I> {
    type Error = I::Error;
}

impl<I: I2c> I2c for SharedI2c<I> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        // Transactions never nest, so the borrow is always free.
        self.bus.borrow_mut().transaction(address, operations)
    }
}
