use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;

/// Standard operator directory fixture: two restaurants.
pub fn write_operators(path: &Path) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "id, restaurant")?;
    writeln!(file, "op1, Spice Route")?;
    writeln!(file, "op2, Noodle Bar")?;
    Ok(())
}

/// Standard menu fixture for op1.
pub fn write_menu(path: &Path) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "id, operator, name, price, image")?;
    writeln!(file, "burger, op1, Smash Burger, 150.0, burger.jpg")?;
    writeln!(file, "fries, op1, Fries, 49.5,")?;
    writeln!(file, "lassi, op1, Lassi, 60.0,")?;
    Ok(())
}

/// Writes a command script with the standard header.
pub fn write_script(path: &Path, rows: &[&str]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    writeln!(file, "command, actor, order, arg, detail")?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    Ok(())
}
