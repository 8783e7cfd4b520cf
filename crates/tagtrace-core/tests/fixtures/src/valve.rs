/// Opens the relief path when pressure exceeds the set point.
// [I=>D1]
pub fn relieve(pressure_bar: f64) -> bool {
    pressure_bar > 8.0
}
