/*!
# ST-light Language Reference

Programs are a declaration section followed by statements. The
`PROGRAM name ... END_PROGRAM` wrapper and a `BEGIN` before the first
statement are optional. Keywords and identifiers are case-insensitive;
the compiler stores names uppercased.

```text
PROGRAM TankLevel
VAR_INPUT  level : REAL; END_VAR
VAR_OUTPUT pump : BOOL EXPORT; END_VAR
VAR CONSTANT high : REAL := 80.0; low : REAL := 20.0; END_VAR
IF level > high THEN
    pump := FALSE;
ELSIF level < low THEN
    pump := TRUE;
END_IF;
END_PROGRAM
```

## Types

| Type | Width | Registers when exported |
|---|---|---|
| `BOOL` | 1 bit | 1 |
| `INT` | signed 16 | 1 |
| `DINT` | signed 32 | 2 |
| `DWORD` | unsigned 32 | 2 |
| `REAL` | 32-bit float | 2 |

Mixed numeric operands are promoted along `INT < DINT < DWORD < REAL`.
Assigning a numeric value converts it to the variable's type. `BOOL` does
not mix with numbers; use `BOOL_TO_INT` and friends. Integer arithmetic
wraps at the type width. Integer division or `MOD` by zero stops the
program with `DIVISION BY ZERO`; REAL division by zero yields infinity.

## Declarations

`VAR`, `VAR_INPUT`, `VAR_OUTPUT` and `VAR CONSTANT` (or `VAR CONST`)
blocks end with `END_VAR`. Each entry is `name [, name] : TYPE [EXPORT]
[:= literal];`. A program holds at most 32 variables. Constants need an
initializer. `EXPORT` publishes the variable in the input-register
export pool after every successful run.

## Statements

- `x := expr;`
- `IF c THEN ... ELSIF c THEN ... ELSE ... END_IF;`
- `CASE sel OF 1, 2: ...; 5..7: ...; ELSE ... END_CASE;`
- `FOR i := a TO b [BY s] DO ... END_FOR;`
- `WHILE c DO ... END_WHILE;`
- `REPEAT ... UNTIL c END_REPEAT;`
- `EXIT;` leaves the innermost loop. Loops nest at most 8 deep.
- `RETURN;` ends the run.

## Operators

Lowest precedence first: `OR` `XOR`, `AND` `&`, comparisons
`= <> < > <= >=`, `+ -`, `* / MOD SHL SHR`, unary `-` `NOT`.

## Functions

`ABS MIN MAX LIMIT(mn, in, mx) SEL(g, in0, in1) SQRT SIN COS TAN ROUND
TRUNC FLOOR CEIL` plus the conversions `INT_TO_REAL REAL_TO_INT
DINT_TO_REAL REAL_TO_DINT BOOL_TO_INT INT_TO_BOOL DWORD_TO_INT
INT_TO_DWORD INT_TO_DINT DINT_TO_INT`. `ROUND`, `TRUNC`, `FLOOR` and
`CEIL` return `INT`, clamped to its range.

## Limits

A run is stopped after 10000 instructions with `MAX STEPS EXCEEDED`.
The operand stack holds 64 values. A compiled program has at most 1024
instructions.
*/
